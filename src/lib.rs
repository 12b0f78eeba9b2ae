//! PayBridge payment signing library
//!
//! Canonical signing and verification for WeChat Pay (MD5 / HMAC-SHA256 over
//! XML) and Alipay (RSA / RSA2 over form and JSON), the request orchestrator
//! that wraps every gateway call, and validation of inbound notifications.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use core::{AppError, ParameterSet, Result};
pub use modules::gateways;
pub use modules::notifications;
pub use modules::signing;
