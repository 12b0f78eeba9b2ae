use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Key text could not be turned into a usable RSA key or shared secret
    #[error("Key material error: {reason}")]
    KeyMaterial {
        reason: String,
        /// Offending raw key text, kept for diagnosis but never rendered by Display
        raw: String,
    },

    /// Signature algorithm tag not recognized (or not valid for this gateway)
    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Business payload rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network or IO failure talking to the gateway
    #[error("Transport error: {0}")]
    Transport(String),

    /// Gateway answered with a non-success status
    #[error("Gateway {gateway} rejected the request: {message} ({code})")]
    Protocol {
        gateway: String,
        code: String,
        message: String,
    },

    /// Signature verification failed on a response or notification
    #[error("Signature error: {0}")]
    Signature(String),

    /// Malformed XML/JSON/form body
    #[error("Decode error: {0}")]
    Decode(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Transport(format!("request timed out: {}", e))
        } else if e.is_connect() {
            AppError::Transport(format!("connection failed: {}", e))
        } else {
            AppError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Decode(format!("JSON: {}", e))
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(e: quick_xml::Error) -> Self {
        AppError::Decode(format!("XML: {}", e))
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::KeyMaterial { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::UnsupportedAlgorithm(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Protocol { .. } => StatusCode::BAD_GATEWAY,
            AppError::Signature(_) => StatusCode::UNAUTHORIZED,
            AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Helper functions for common error scenarios
impl AppError {
    pub fn key_material(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        AppError::KeyMaterial {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::Configuration(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        AppError::Transport(msg.into())
    }

    pub fn protocol(
        gateway: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        AppError::Protocol {
            gateway: gateway.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn signature(msg: impl Into<String>) -> Self {
        AppError::Signature(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        AppError::Decode(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Raw key text attached to a key material error
    pub fn raw_key_text(&self) -> Option<&str> {
        match self {
            AppError::KeyMaterial { raw, .. } => Some(raw.as_str()),
            _ => None,
        }
    }

    /// Signature failures mean the payload is untrusted and must reach an operator
    pub fn is_security_event(&self) -> bool {
        matches!(self, AppError::Signature(_))
    }
}
