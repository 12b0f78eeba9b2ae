use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::core::{AppError, ParameterSet, Result};
use crate::modules::gateways::models::alipay::{
    AlipayResult, PagePayKind, TradePagePayParams, TradePreCreateParams, TradePreCreateResponse,
    TradeQueryParams, TradeQueryResponse, TradeRefundParams, TradeRefundResponse,
    METHOD_TRADE_PRECREATE, METHOD_TRADE_QUERY, METHOD_TRADE_REFUND,
};
use crate::modules::gateways::models::{AlipayConfig, GatewayCredential};
use crate::modules::signing::{
    CanonicalOptions, CanonicalString, RsaPrivateKey, RsaPublicKey, SIGN_FIELD, SIGN_TYPE_FIELD,
};

use super::gateway_trait::{GatewayProfile, OpenedResponse, WireFormat};
use super::orchestrator::Orchestrator;
use super::transport::{HttpMethod, HttpTransport, OutboundRequest, Transport};
use super::wire::{decode_form, encode_form, JsonEnvelope};

const GATEWAY: &str = "alipay";
const RESPONSE_SUFFIX: &str = "_response";
const ERROR_RESPONSE: &str = "error_response";
const BIZ_CONTENT: &str = "biz_content";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const ACK_SUCCESS: &str = "success";
pub const ACK_FAILURE: &str = "fail";

/// Fields left out of a notification's canonical string
const NOTIFICATION_EXCLUDED: &[&str] = &[SIGN_FIELD, SIGN_TYPE_FIELD];

/// Alipay OpenAPI: RSA/RSA2 signatures, form-encoded requests, JSON responses
#[derive(Debug)]
pub struct AlipayProfile {
    credential: GatewayCredential,
    base_url: String,
    notify_url: String,
}

impl AlipayProfile {
    pub fn new(config: &AlipayConfig) -> Result<Self> {
        let algorithm = config.resolve_sign_type()?;
        let private_key = RsaPrivateKey::from_raw(&config.app_private_key)?;
        let public_key = config.public_key().map(RsaPublicKey::from_raw).transpose()?;
        if public_key.is_none() {
            tracing::warn!(
                gateway = GATEWAY,
                "alipay_public_key not configured, responses will not be verified"
            );
        }
        let credential = GatewayCredential::rsa(&config.app_id, algorithm, private_key, public_key)?;

        Ok(Self {
            credential,
            base_url: config.base_url().to_string(),
            notify_url: config.pay_notify_url.clone(),
        })
    }

    /// Response node name for a method, `alipay.trade.query` -> `alipay_trade_query_response`
    pub fn response_node(method: &str) -> String {
        format!("{}{}", method.replace('.', "_"), RESPONSE_SUFFIX)
    }

    fn signed_url(&self, signed: &ParameterSet) -> Result<String> {
        Ok(format!("{}?{}", self.base_url, encode_form(signed)?))
    }
}

/// Gateway timestamp, wall-clock time in China Standard Time
fn gateway_timestamp() -> String {
    let offset = FixedOffset::east_opt(8 * 3600).expect("Valid offset");
    Utc::now()
        .with_timezone(&offset)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

impl GatewayProfile for AlipayProfile {
    fn name(&self) -> &'static str {
        GATEWAY
    }

    fn wire_format(&self) -> WireFormat {
        WireFormat::FormJson
    }

    fn credential(&self) -> &GatewayCredential {
        &self.credential
    }

    fn protocol_fields(&self, method: &str) -> ParameterSet {
        let mut fields = ParameterSet::new();
        fields.insert("app_id".into(), self.credential.merchant_id().to_string());
        fields.insert("method".into(), method.to_string());
        fields.insert("format".into(), "JSON".into());
        fields.insert("charset".into(), "utf-8".into());
        fields.insert(
            SIGN_TYPE_FIELD.into(),
            self.credential.algorithm().tag().to_string(),
        );
        fields.insert("timestamp".into(), gateway_timestamp());
        fields.insert("version".into(), "1.0".into());
        if !self.notify_url.trim().is_empty() {
            fields.insert("notify_url".into(), self.notify_url.clone());
        }
        fields
    }

    fn canonical_options(&self) -> CanonicalOptions<'_> {
        CanonicalOptions::plain()
    }

    fn encode_request(&self, _method: &str, signed: &ParameterSet) -> Result<OutboundRequest> {
        Ok(OutboundRequest {
            method: HttpMethod::Get,
            url: self.signed_url(signed)?,
            content_type: "application/x-www-form-urlencoded",
            body: Vec::new(),
        })
    }

    fn open_response(&self, method: &str, raw: &[u8]) -> Result<OpenedResponse> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| AppError::decode(format!("response is not UTF-8: {}", e)))?;
        let envelope = JsonEnvelope::parse(text)?;

        let node_name = Self::response_node(method);
        let content = match envelope.node(&node_name) {
            Some(content) => content,
            None => {
                if let Some(error_node) = envelope.node(ERROR_RESPONSE) {
                    let result: AlipayResult = serde_json::from_str(error_node)?;
                    return Err(result.into_error());
                }
                return Err(AppError::decode(format!(
                    "response has neither {} nor {}",
                    node_name, ERROR_RESPONSE
                )));
            }
        };

        Ok(OpenedResponse {
            signed_content: CanonicalString::from_raw(content),
            signature: envelope.string_member(SIGN_FIELD)?,
            fields: serde_json::from_str(content)?,
        })
    }

    fn check_business_status(&self, fields: &Value) -> Result<()> {
        let result: AlipayResult = serde_json::from_value(fields.clone())?;
        if !result.is_success() {
            return Err(result.into_error());
        }
        Ok(())
    }

    fn parse_notification(&self, raw: &[u8]) -> Result<ParameterSet> {
        decode_form(raw)
    }

    fn notification_options(&self) -> CanonicalOptions<'_> {
        CanonicalOptions::excluding(NOTIFICATION_EXCLUDED)
    }

    fn ack_success(&self) -> String {
        ACK_SUCCESS.to_string()
    }

    fn ack_failure(&self, _reason: Option<&str>) -> String {
        ACK_FAILURE.to_string()
    }
}

/// Alipay application client
#[derive(Clone)]
pub struct AlipayClient {
    orchestrator: Orchestrator<AlipayProfile>,
}

impl AlipayClient {
    pub fn new(config: &AlipayConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let profile = Arc::new(AlipayProfile::new(config)?);
        Ok(Self {
            orchestrator: Orchestrator::new(profile, transport),
        })
    }

    pub fn from_config(config: &AlipayConfig) -> Result<Self> {
        Self::new(config, Arc::new(HttpTransport::new()))
    }

    pub fn profile(&self) -> &AlipayProfile {
        self.orchestrator.profile()
    }

    /// QR checkout: returns the code content to render
    pub async fn trade_precreate(
        &self,
        params: TradePreCreateParams,
    ) -> Result<(TradePreCreateResponse, Vec<u8>)> {
        params.validate()?;
        self.call(METHOD_TRADE_PRECREATE, &params).await
    }

    pub async fn trade_query(
        &self,
        params: TradeQueryParams,
    ) -> Result<(TradeQueryResponse, Vec<u8>)> {
        params.validate()?;
        self.call(METHOD_TRADE_QUERY, &params).await
    }

    pub async fn trade_refund(
        &self,
        params: TradeRefundParams,
    ) -> Result<(TradeRefundResponse, Vec<u8>)> {
        params.validate()?;
        self.call(METHOD_TRADE_REFUND, &params).await
    }

    /// Signed redirect URL for the web or wap cashier; no network call is made
    pub fn page_pay_url(&self, kind: PagePayKind, mut params: TradePagePayParams) -> Result<String> {
        params.validate()?;
        if params.product_code.trim().is_empty() {
            params.product_code = kind.product_code().to_string();
        }
        let signed = self
            .orchestrator
            .build_signed(kind.method(), biz_payload(&params)?)?;
        self.profile().signed_url(&signed)
    }

    async fn call<B, T>(&self, method: &str, biz: &B) -> Result<(T, Vec<u8>)>
    where
        B: Serialize,
        T: serde::de::DeserializeOwned,
    {
        self.orchestrator.execute(method, biz_payload(biz)?).await
    }
}

/// Wrap business content as the JSON-encoded `biz_content` field
fn biz_payload<B: Serialize>(biz: &B) -> Result<ParameterSet> {
    let mut payload = ParameterSet::new();
    payload.insert(BIZ_CONTENT.to_string(), serde_json::to_string(biz)?);
    Ok(payload)
}
