use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::core::{AppError, ParameterSet, Result};
use crate::modules::gateways::models::wxpay::{
    OrderQueryParams, OrderQueryResponse, RefundParams, RefundResponse, UnifiedOrderParams,
    UnifiedOrderResponse, PATH_ORDER_QUERY, PATH_REFUND, PATH_UNIFIED_ORDER, WXPAY_FAIL,
    WXPAY_SUCCESS,
};
use crate::modules::gateways::models::{GatewayCredential, WxpayConfig};
use crate::modules::signing::{canonicalize, CanonicalOptions, SIGN_FIELD, SIGN_TYPE_FIELD};

use super::gateway_trait::{fields_from_params, GatewayProfile, OpenedResponse, WireFormat};
use super::orchestrator::Orchestrator;
use super::transport::{HttpMethod, HttpTransport, OutboundRequest, Transport};
use super::wire::{decode_xml, encode_xml};

const GATEWAY: &str = "wxpay";
const CONTENT_TYPE_XML: &str = "application/xml";

/// WeChat Pay v2: shared-secret MAC over a flat XML document
#[derive(Debug)]
pub struct WxpayProfile {
    credential: GatewayCredential,
    base_url: String,
}

impl WxpayProfile {
    pub fn new(config: &WxpayConfig) -> Result<Self> {
        let algorithm = config.resolve_sign_type()?;
        let credential = GatewayCredential::shared_secret(&config.mch_id, &config.key, algorithm)?;

        Ok(Self {
            credential,
            base_url: config.base_url().trim_end_matches('/').to_string(),
        })
    }

    fn mac_options(&self) -> CanonicalOptions<'_> {
        let options = CanonicalOptions::plain();
        match self.credential.secret() {
            Some(secret) => options.with_secret(secret),
            None => options,
        }
    }
}

impl GatewayProfile for WxpayProfile {
    fn name(&self) -> &'static str {
        GATEWAY
    }

    fn wire_format(&self) -> WireFormat {
        WireFormat::Xml
    }

    fn credential(&self) -> &GatewayCredential {
        &self.credential
    }

    fn protocol_fields(&self, _method: &str) -> ParameterSet {
        let mut fields = ParameterSet::new();
        fields.insert("mch_id".into(), self.credential.merchant_id().to_string());
        fields.insert(
            "nonce_str".into(),
            Uuid::new_v4().simple().to_string(),
        );
        fields.insert(
            SIGN_TYPE_FIELD.into(),
            self.credential.algorithm().tag().to_string(),
        );
        fields
    }

    fn canonical_options(&self) -> CanonicalOptions<'_> {
        self.mac_options()
    }

    fn encode_request(&self, method: &str, signed: &ParameterSet) -> Result<OutboundRequest> {
        Ok(OutboundRequest {
            method: HttpMethod::Post,
            url: format!("{}{}", self.base_url, method),
            content_type: CONTENT_TYPE_XML,
            body: encode_xml(signed)?,
        })
    }

    fn open_response(&self, _method: &str, raw: &[u8]) -> Result<OpenedResponse> {
        let params = decode_xml(raw)?;

        let return_code = match params.get("return_code").map(|code| code.trim()) {
            Some(code) if !code.is_empty() => code,
            _ => return Err(AppError::decode("response has no return_code")),
        };
        if return_code != WXPAY_SUCCESS {
            let message = params.get("return_msg").cloned().unwrap_or_default();
            return Err(AppError::protocol(GATEWAY, return_code, message));
        }

        Ok(OpenedResponse {
            signed_content: canonicalize(&params, &self.mac_options()),
            signature: params.get(SIGN_FIELD).cloned(),
            fields: fields_from_params(&params),
        })
    }

    fn check_business_status(&self, fields: &Value) -> Result<()> {
        let field = |name: &str| fields.get(name).and_then(Value::as_str).unwrap_or_default();

        if field("result_code") != WXPAY_SUCCESS {
            return Err(AppError::protocol(
                GATEWAY,
                field("err_code"),
                field("err_code_des"),
            ));
        }
        Ok(())
    }

    fn parse_notification(&self, raw: &[u8]) -> Result<ParameterSet> {
        decode_xml(raw)
    }

    fn notification_options(&self) -> CanonicalOptions<'_> {
        self.mac_options()
    }

    fn ack_success(&self) -> String {
        ack_xml(WXPAY_SUCCESS, "OK")
    }

    fn ack_failure(&self, reason: Option<&str>) -> String {
        ack_xml(WXPAY_FAIL, reason.unwrap_or(WXPAY_FAIL))
    }
}

fn ack_xml(code: &str, message: &str) -> String {
    format!(
        "<xml><return_code><![CDATA[{}]]></return_code><return_msg><![CDATA[{}]]></return_msg></xml>",
        code,
        message.replace("]]>", "]] >")
    )
}

/// WeChat Pay merchant client
#[derive(Clone)]
pub struct WxpayClient {
    orchestrator: Orchestrator<WxpayProfile>,
    /// Orchestrator presenting the merchant certificate, for `secapi` calls
    cert_orchestrator: Option<Orchestrator<WxpayProfile>>,
    pay_notify_url: String,
    refund_notify_url: String,
}

impl WxpayClient {
    pub fn new(config: &WxpayConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let profile = Arc::new(WxpayProfile::new(config)?);
        Ok(Self {
            orchestrator: Orchestrator::new(profile, transport),
            cert_orchestrator: None,
            pay_notify_url: config.pay_notify_url.clone(),
            refund_notify_url: config.refund_notify_url.clone(),
        })
    }

    /// Use `transport` (carrying the merchant certificate) for refunds
    pub fn with_cert_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.cert_orchestrator = Some(self.orchestrator.with_transport(transport));
        self
    }

    /// Client over reqwest; a configured certificate enables refunds
    pub fn from_config(config: &WxpayConfig) -> Result<Self> {
        let client = Self::new(config, Arc::new(HttpTransport::new()))?;
        match (&config.app_cert_pem, &config.app_key_pem) {
            (Some(cert), Some(key)) if !cert.trim().is_empty() && !key.trim().is_empty() => {
                let transport = HttpTransport::with_identity(cert, key)?;
                Ok(client.with_cert_transport(Arc::new(transport)))
            }
            _ => Ok(client),
        }
    }

    pub fn profile(&self) -> &WxpayProfile {
        self.orchestrator.profile()
    }

    /// Place an order (`/pay/unifiedorder`)
    pub async fn unified_order(
        &self,
        params: UnifiedOrderParams,
    ) -> Result<(UnifiedOrderResponse, Vec<u8>)> {
        params.validate()?;
        let payload = params.into_parameters(&self.pay_notify_url)?;
        self.orchestrator.execute(PATH_UNIFIED_ORDER, payload).await
    }

    /// Look up an order by merchant or WeChat transaction id
    pub async fn order_query(
        &self,
        params: OrderQueryParams,
    ) -> Result<(OrderQueryResponse, Vec<u8>)> {
        params.validate()?;
        self.orchestrator
            .execute(PATH_ORDER_QUERY, params.into_parameters())
            .await
    }

    /// Refund an order; requires a certificate transport
    pub async fn refund(&self, params: RefundParams) -> Result<(RefundResponse, Vec<u8>)> {
        params.validate()?;
        let orchestrator = self.cert_orchestrator.as_ref().ok_or_else(|| {
            AppError::configuration("wxpay refund requires a merchant certificate")
        })?;
        let payload = params.into_parameters(&self.refund_notify_url);
        orchestrator.execute(PATH_REFUND, payload).await
    }
}
