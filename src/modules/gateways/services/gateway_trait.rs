use serde_json::Value;

use crate::core::{AppError, ParameterSet, Result};
use crate::modules::gateways::models::GatewayCredential;
use crate::modules::signing::{CanonicalOptions, CanonicalString, SignatureAlgorithm, SIGN_TYPE_FIELD};

use super::transport::OutboundRequest;

/// Body encoding a gateway speaks on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// One-level XML document (WeChat Pay)
    Xml,
    /// URL-encoded request, JSON response (Alipay)
    FormJson,
}

/// A decoded gateway response before verification
#[derive(Debug, Clone)]
pub struct OpenedResponse {
    /// Exact input the gateway signed
    pub signed_content: CanonicalString,
    /// Signature the gateway attached, if any
    pub signature: Option<String>,
    /// Response fields as a JSON object, ready for typed mapping
    pub fields: Value,
}

/// Capability set that distinguishes one gateway from another.
///
/// The request orchestrator and the notification validator are generic
/// over this trait; everything vendor-specific (field names, envelope
/// shape, status codes, acknowledgements) lives in an implementation.
pub trait GatewayProfile: Send + Sync {
    /// Short name used in logs and protocol errors
    fn name(&self) -> &'static str;

    fn wire_format(&self) -> WireFormat;

    fn credential(&self) -> &GatewayCredential;

    /// Fixed protocol fields merged over the business payload for `method`
    fn protocol_fields(&self, method: &str) -> ParameterSet;

    /// Canonicalization rules for outbound signing and response verification
    fn canonical_options(&self) -> CanonicalOptions<'_>;

    /// Serialize a signed parameter set into a transport request
    fn encode_request(&self, method: &str, signed: &ParameterSet) -> Result<OutboundRequest>;

    /// Decode a raw response body.
    ///
    /// Gateway-level failures (an explicit fail status) must be returned as
    /// `Protocol` errors here, before any signature check is attempted.
    fn open_response(&self, method: &str, raw: &[u8]) -> Result<OpenedResponse>;

    /// Business status check on verified response fields
    fn check_business_status(&self, fields: &Value) -> Result<()>;

    /// Decode an inbound notification body into a flat parameter set
    fn parse_notification(&self, raw: &[u8]) -> Result<ParameterSet>;

    /// Canonicalization rules for notification verification
    fn notification_options(&self) -> CanonicalOptions<'_>;

    /// Algorithm for a notification: always the configured one.
    ///
    /// A `sign_type` carried by the payload is untrusted; it is accepted
    /// only when it names the configured algorithm.
    fn notification_algorithm(&self, params: &ParameterSet) -> Result<SignatureAlgorithm> {
        let configured = self.credential().algorithm();
        match params.get(SIGN_TYPE_FIELD).map(|tag| tag.trim()) {
            Some(tag) if !tag.is_empty() => {
                let claimed = SignatureAlgorithm::parse_in_family(tag, configured.family())?;
                if claimed != configured {
                    return Err(AppError::UnsupportedAlgorithm(format!(
                        "{} does not match the configured {}",
                        claimed, configured
                    )));
                }
                Ok(configured)
            }
            _ => Ok(configured),
        }
    }

    fn ack_success(&self) -> String;

    fn ack_failure(&self, reason: Option<&str>) -> String;
}

/// Turn a flat parameter set into a JSON object of strings
pub fn fields_from_params(params: &ParameterSet) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}
