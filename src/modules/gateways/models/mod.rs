pub mod alipay;
pub mod credential;
pub mod gateway_config;
pub mod wxpay;

pub use credential::GatewayCredential;
pub use gateway_config::{
    AlipayConfig, WxpayConfig, ALIPAY_MAIN_HOST, DEFAULT_ALIPAY_SIGN_TYPE,
    DEFAULT_WXPAY_SIGN_TYPE, WXPAY_MAIN_HOST,
};
