pub mod alipay;
pub mod gateway_trait;
pub mod orchestrator;
pub mod transport;
pub mod wire;
pub mod wxpay;

pub use alipay::{AlipayClient, AlipayProfile};
pub use gateway_trait::{GatewayProfile, OpenedResponse, WireFormat};
pub use orchestrator::Orchestrator;
pub use transport::{HttpMethod, HttpTransport, OutboundRequest, Transport};
pub use wxpay::{WxpayClient, WxpayProfile};
