use std::env;
use std::fs;

use crate::core::{AppError, Result};
use crate::modules::gateways::models::{AlipayConfig, WxpayConfig};

pub mod server;

pub use server::ServerConfig;

/// Notification receiver configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    /// Present when `WXPAY_MCH_ID` is set
    pub wxpay: Option<WxpayConfig>,
    /// Present when `ALIPAY_APP_ID` is set
    pub alipay: Option<AlipayConfig>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| AppError::Configuration(format!("{} not set", name)))
        };

        let port = match var("SERVER_PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| AppError::Configuration("Invalid SERVER_PORT".to_string()))?,
            None => 8080,
        };

        let wxpay = match var("WXPAY_MCH_ID") {
            Some(mch_id) => Some(WxpayConfig {
                mch_id,
                key: required("WXPAY_KEY")?,
                sign_type: var("WXPAY_SIGN_TYPE"),
                pay_notify_url: var("WXPAY_PAY_NOTIFY_URL").unwrap_or_default(),
                refund_notify_url: var("WXPAY_REFUND_NOTIFY_URL").unwrap_or_default(),
                app_cert_pem: var("WXPAY_CERT_PATH").map(read_pem).transpose()?,
                app_key_pem: var("WXPAY_CERT_KEY_PATH").map(read_pem).transpose()?,
                base_url: var("WXPAY_BASE_URL"),
            }),
            None => None,
        };

        let alipay = match var("ALIPAY_APP_ID") {
            Some(app_id) => Some(AlipayConfig {
                app_id,
                sign_type: var("ALIPAY_SIGN_TYPE"),
                app_private_key: required("ALIPAY_PRIVATE_KEY")?,
                alipay_public_key: var("ALIPAY_PUBLIC_KEY"),
                pay_notify_url: var("ALIPAY_NOTIFY_URL").unwrap_or_default(),
                base_url: var("ALIPAY_BASE_URL"),
            }),
            None => None,
        };

        Ok(Config {
            app: AppConfig {
                env: var("APP_ENV").unwrap_or_else(|| "development".to_string()),
                log_level: var("LOG_LEVEL").unwrap_or_else(|| "debug".to_string()),
            },
            server: ServerConfig::new(
                var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
            ),
            wxpay,
            alipay,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.wxpay.is_none() && self.alipay.is_none() {
            return Err(AppError::Configuration(
                "No gateway configured: set WXPAY_MCH_ID or ALIPAY_APP_ID".to_string(),
            ));
        }

        if let Some(alipay) = &self.alipay {
            if alipay.public_key().is_none() {
                tracing::warn!("ALIPAY_PUBLIC_KEY not set, alipay notifications will be rejected");
            }
        }

        if self.server.port == 0 {
            return Err(AppError::Configuration(
                "SERVER_PORT must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn read_pem(path: String) -> Result<String> {
    fs::read_to_string(&path)
        .map_err(|e| AppError::Configuration(format!("cannot read {}: {}", path, e)))
}
