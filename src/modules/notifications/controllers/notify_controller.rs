use std::sync::Arc;

use actix_web::{http::header::ContentType, web, HttpResponse};
use async_trait::async_trait;

use crate::core::Result;
use crate::modules::gateways::models::alipay::AlipayPayNotification;
use crate::modules::gateways::models::wxpay::WxpayPayNotification;
use crate::modules::gateways::services::{AlipayProfile, GatewayProfile, WireFormat, WxpayProfile};
use crate::modules::notifications::services::NotificationValidator;

/// Business hook invoked only with verified notifications
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    async fn on_wxpay_payment(&self, notification: WxpayPayNotification) -> Result<()>;

    async fn on_alipay_payment(&self, notification: AlipayPayNotification) -> Result<()>;
}

/// Default handler: records the trusted notification and acknowledges it
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotificationHandler;

#[async_trait]
impl NotificationHandler for LoggingNotificationHandler {
    async fn on_wxpay_payment(&self, notification: WxpayPayNotification) -> Result<()> {
        tracing::info!(
            out_trade_no = %notification.out_trade_no,
            transaction_id = %notification.transaction_id,
            result_code = %notification.header.result_code,
            total_fee = %notification.total_fee,
            "wxpay payment notification"
        );
        Ok(())
    }

    async fn on_alipay_payment(&self, notification: AlipayPayNotification) -> Result<()> {
        tracing::info!(
            out_trade_no = %notification.out_trade_no,
            trade_no = %notification.trade_no,
            trade_status = %notification.trade_status,
            total_amount = %notification.total_amount,
            "alipay payment notification"
        );
        Ok(())
    }
}

/// Shared state behind the notification routes
pub struct NotificationController {
    wxpay: Option<NotificationValidator<WxpayProfile>>,
    alipay: Option<NotificationValidator<AlipayProfile>>,
    handler: Arc<dyn NotificationHandler>,
}

impl NotificationController {
    pub fn new(handler: Arc<dyn NotificationHandler>) -> Self {
        Self {
            wxpay: None,
            alipay: None,
            handler,
        }
    }

    pub fn with_wxpay(mut self, profile: Arc<WxpayProfile>) -> Self {
        self.wxpay = Some(NotificationValidator::new(profile));
        self
    }

    pub fn with_alipay(mut self, profile: Arc<AlipayProfile>) -> Self {
        self.alipay = Some(NotificationValidator::new(profile));
        self
    }

    /// Names of the gateways accepting notifications
    pub fn gateways(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if let Some(validator) = &self.wxpay {
            names.push(validator.profile().name());
        }
        if let Some(validator) = &self.alipay {
            names.push(validator.profile().name());
        }
        names
    }
}

/// Verify, dispatch, and build the acknowledgement for one notification.
///
/// The gateway only reads the body, so every outcome is answered with 200.
async fn acknowledge<P, N, F, Fut>(
    validator: &NotificationValidator<P>,
    body: &[u8],
    dispatch: F,
) -> HttpResponse
where
    P: GatewayProfile,
    N: serde::de::DeserializeOwned,
    F: FnOnce(N) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let gateway = validator.profile().name();
    let ack = match validator.validate::<N>(body) {
        Ok(notification) => match dispatch(notification).await {
            Ok(()) => validator.ack_success(),
            Err(e) => {
                tracing::error!(gateway, error = %e, "notification handler failed");
                validator.ack_failure(Some("handler failed"))
            }
        },
        Err(e) => {
            tracing::warn!(
                gateway,
                error = %e,
                security_event = e.is_security_event(),
                "notification rejected"
            );
            validator.ack_failure(Some(&e.to_string()))
        }
    };

    let content_type = match validator.profile().wire_format() {
        WireFormat::Xml => ContentType::xml(),
        WireFormat::FormJson => ContentType::plaintext(),
    };
    HttpResponse::Ok().content_type(content_type).body(ack)
}

/// POST /notify/wxpay
pub async fn wxpay_notify(
    controller: web::Data<NotificationController>,
    body: web::Bytes,
) -> HttpResponse {
    let Some(validator) = &controller.wxpay else {
        return HttpResponse::NotFound().finish();
    };
    let handler = Arc::clone(&controller.handler);
    acknowledge(validator, &body, |n: WxpayPayNotification| async move {
        handler.on_wxpay_payment(n).await
    })
    .await
}

/// POST /notify/alipay
pub async fn alipay_notify(
    controller: web::Data<NotificationController>,
    body: web::Bytes,
) -> HttpResponse {
    let Some(validator) = &controller.alipay else {
        return HttpResponse::NotFound().finish();
    };
    let handler = Arc::clone(&controller.handler);
    acknowledge(validator, &body, |n: AlipayPayNotification| async move {
        handler.on_alipay_payment(n).await
    })
    .await
}

/// Configure notification routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notify")
            .route("/wxpay", web::post().to(wxpay_notify))
            .route("/alipay", web::post().to(alipay_notify)),
    );
}
