use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::core::{AppError, ParameterSet, Result};
use crate::modules::signing::{canonicalize, SIGN_FIELD};

use super::gateway_trait::{GatewayProfile, OpenedResponse};
use super::transport::{OutboundRequest, Transport};

/// Generic request pipeline shared by every gateway.
///
/// One call walks `Building -> Signed -> Transmitted -> ResponseReceived ->
/// Verified -> Parsed`; any step may fail and no step is retried. The
/// orchestrator holds no mutable state, so it can be shared across tasks.
pub struct Orchestrator<P: GatewayProfile> {
    profile: Arc<P>,
    transport: Arc<dyn Transport>,
}

impl<P: GatewayProfile> Clone for Orchestrator<P> {
    fn clone(&self) -> Self {
        Self {
            profile: Arc::clone(&self.profile),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<P: GatewayProfile> Orchestrator<P> {
    pub fn new(profile: Arc<P>, transport: Arc<dyn Transport>) -> Self {
        Self { profile, transport }
    }

    /// Same profile over a different transport
    pub fn with_transport(&self, transport: Arc<dyn Transport>) -> Self {
        Self {
            profile: Arc::clone(&self.profile),
            transport,
        }
    }

    pub fn profile(&self) -> &P {
        &self.profile
    }

    /// Merge protocol fields over the payload and attach the signature
    pub fn build_signed(&self, method: &str, payload: ParameterSet) -> Result<ParameterSet> {
        let gateway = self.profile.name();
        let mut params = payload;
        params.extend(self.profile.protocol_fields(method));
        debug!(gateway, method, fields = params.len(), "request built");

        let canonical = canonicalize(&params, &self.profile.canonical_options());
        let signature = self.profile.credential().sign(&canonical)?;
        params.insert(SIGN_FIELD.to_string(), signature.into_string());
        debug!(
            gateway,
            method,
            algorithm = %self.profile.credential().algorithm(),
            "request signed"
        );

        Ok(params)
    }

    /// Build, sign and encode a request without sending it
    pub fn prepare(&self, method: &str, payload: ParameterSet) -> Result<OutboundRequest> {
        let signed = self.build_signed(method, payload)?;
        self.profile.encode_request(method, &signed)
    }

    /// Run one request end to end, returning the typed result and the raw body
    pub async fn execute<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: ParameterSet,
    ) -> Result<(T, Vec<u8>)> {
        let gateway = self.profile.name();
        let request = self.prepare(method, payload)?;

        info!(gateway, method, url = %request.url, "transmitting request");
        let raw = request.send(self.transport.as_ref()).await.map_err(|e| {
            warn!(gateway, method, error = %e, "transport failed");
            e
        })?;
        debug!(gateway, method, bytes = raw.len(), "response received");

        let opened = self.profile.open_response(method, &raw).map_err(|e| {
            if let AppError::Protocol { code, message, .. } = &e {
                warn!(gateway, method, code = %code, message = %message, "gateway rejected request");
            }
            e
        })?;

        self.verify_response(method, &opened)?;

        self.profile.check_business_status(&opened.fields).map_err(|e| {
            warn!(gateway, method, error = %e, "business status not successful");
            e
        })?;

        let parsed = serde_json::from_value(opened.fields)?;
        debug!(gateway, method, "response parsed");
        Ok((parsed, raw))
    }

    fn verify_response(&self, method: &str, opened: &OpenedResponse) -> Result<()> {
        let gateway = self.profile.name();
        let credential = self.profile.credential();

        if !credential.can_verify() {
            warn!(gateway, method, "no verification key configured, response signature not checked");
            return Ok(());
        }

        let signature = match opened.signature.as_deref() {
            Some(signature) if !signature.trim().is_empty() => signature,
            _ => {
                error!(gateway, method, security_event = true, "response carries no signature");
                return Err(AppError::signature(format!("{} response is unsigned", gateway)));
            }
        };

        credential
            .verify(&opened.signed_content, signature)
            .into_result(&format!("{} response", gateway))
            .map_err(|e| {
                error!(gateway, method, security_event = true, error = %e, "response signature rejected");
                e
            })?;

        info!(gateway, method, "response verified");
        Ok(())
    }
}
