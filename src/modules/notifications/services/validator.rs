use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::core::params::into_typed;
use crate::core::{AppError, ParameterSet, Result};
use crate::modules::gateways::services::GatewayProfile;
use crate::modules::signing::{canonicalize, SIGN_FIELD};

/// Verifies gateway-pushed callbacks before anything else touches them.
///
/// A payload that fails here is never mapped into a notification type.
pub struct NotificationValidator<P: GatewayProfile> {
    profile: Arc<P>,
}

impl<P: GatewayProfile> Clone for NotificationValidator<P> {
    fn clone(&self) -> Self {
        Self {
            profile: Arc::clone(&self.profile),
        }
    }
}

impl<P: GatewayProfile> NotificationValidator<P> {
    pub fn new(profile: Arc<P>) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &P {
        &self.profile
    }

    /// Verify a raw body and return its fields with the signature removed
    pub fn validate_params(&self, raw: &[u8]) -> Result<ParameterSet> {
        let gateway = self.profile.name();
        let mut params = self.profile.parse_notification(raw)?;
        debug!(gateway, fields = params.len(), "notification parsed");

        let signature = match params.remove(SIGN_FIELD) {
            Some(signature) if !signature.trim().is_empty() => signature,
            _ => {
                warn!(gateway, security_event = true, "notification without signature rejected");
                return Err(AppError::signature(format!(
                    "{} notification carries no signature",
                    gateway
                )));
            }
        };

        let algorithm = self.profile.notification_algorithm(&params).map_err(|e| {
            warn!(gateway, security_event = true, error = %e, "notification sign_type rejected");
            AppError::signature(format!("{} notification sign_type rejected: {}", gateway, e))
        })?;

        let canonical = canonicalize(&params, &self.profile.notification_options());
        self.profile
            .credential()
            .verify_with(&canonical, &signature, algorithm)
            .into_result(&format!("{} notification", gateway))
            .map_err(|e| {
                error!(gateway, security_event = true, error = %e, "notification signature rejected");
                e
            })?;

        info!(gateway, %algorithm, "notification verified");
        Ok(params)
    }

    /// Verify a raw body and map it into `N`
    pub fn validate<N: DeserializeOwned>(&self, raw: &[u8]) -> Result<N> {
        into_typed(self.validate_params(raw)?)
    }

    pub fn ack_success(&self) -> String {
        self.profile.ack_success()
    }

    pub fn ack_failure(&self, reason: Option<&str>) -> String {
        self.profile.ack_failure(reason)
    }
}
