//! Gateway integrations: transport, request orchestration and the
//! WeChat Pay / Alipay profiles.

pub mod models;
pub mod services;

pub use models::{AlipayConfig, GatewayCredential, WxpayConfig};
pub use services::{
    AlipayClient, AlipayProfile, GatewayProfile, HttpTransport, Orchestrator, Transport,
    WxpayClient, WxpayProfile,
};
