use serde::Deserialize;

use crate::core::Result;
use crate::modules::signing::{AlgorithmFamily, SignatureAlgorithm};

/// WeChat Pay signs with MD5 unless told otherwise. Kept as the live
/// gateway's own default so signatures stay byte-compatible; set
/// `sign_type = "HMAC-SHA256"` to upgrade.
pub const DEFAULT_WXPAY_SIGN_TYPE: SignatureAlgorithm = SignatureAlgorithm::Md5;

/// Alipay default when `sign_type` is omitted
pub const DEFAULT_ALIPAY_SIGN_TYPE: SignatureAlgorithm = SignatureAlgorithm::Rsa2;

pub const WXPAY_MAIN_HOST: &str = "https://api.mch.weixin.qq.com";
pub const ALIPAY_MAIN_HOST: &str = "https://openapi.alipay.com/gateway.do";

/// WeChat Pay (MAC gateway) merchant configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WxpayConfig {
    pub mch_id: String,
    /// API key (shared secret)
    pub key: String,
    #[serde(default)]
    pub sign_type: Option<String>,
    #[serde(default)]
    pub pay_notify_url: String,
    #[serde(default)]
    pub refund_notify_url: String,
    /// Merchant certificate, required by the `secapi` endpoints
    #[serde(default)]
    pub app_cert_pem: Option<String>,
    #[serde(default)]
    pub app_key_pem: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Alipay (asymmetric gateway) application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlipayConfig {
    pub app_id: String,
    #[serde(default)]
    pub sign_type: Option<String>,
    /// Application private key, armored or bare base64
    pub app_private_key: String,
    /// Alipay public key; enables response and notification verification
    #[serde(default)]
    pub alipay_public_key: Option<String>,
    #[serde(default)]
    pub pay_notify_url: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl WxpayConfig {
    /// Configured algorithm, falling back to [`DEFAULT_WXPAY_SIGN_TYPE`]
    pub fn resolve_sign_type(&self) -> Result<SignatureAlgorithm> {
        match self.sign_type.as_deref().map(str::trim) {
            Some(tag) if !tag.is_empty() => {
                SignatureAlgorithm::parse_in_family(tag, AlgorithmFamily::SharedSecret)
            }
            _ => {
                tracing::warn!(
                    gateway = "wxpay",
                    default = %DEFAULT_WXPAY_SIGN_TYPE,
                    "sign_type not configured, using gateway default"
                );
                Ok(DEFAULT_WXPAY_SIGN_TYPE)
            }
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(WXPAY_MAIN_HOST)
    }
}

impl AlipayConfig {
    /// Configured algorithm, falling back to [`DEFAULT_ALIPAY_SIGN_TYPE`]
    pub fn resolve_sign_type(&self) -> Result<SignatureAlgorithm> {
        match self.sign_type.as_deref().map(str::trim) {
            Some(tag) if !tag.is_empty() => {
                SignatureAlgorithm::parse_in_family(tag, AlgorithmFamily::Asymmetric)
            }
            _ => Ok(DEFAULT_ALIPAY_SIGN_TYPE),
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(ALIPAY_MAIN_HOST)
    }

    /// Public key text if one is configured and non-blank
    pub fn public_key(&self) -> Option<&str> {
        self.alipay_public_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }
}
