// Notification receiver over HTTP
//
// - Every outcome is answered 200 with the gateway's acknowledgement body
// - The business handler only ever sees verified notifications
// - Routes for unconfigured gateways are 404

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::{Arc, Mutex};

use actix_web::{test, web, App};
use async_trait::async_trait;
use helpers::*;
use paybridge::core::{AppError, Result};
use paybridge::gateways::models::alipay::AlipayPayNotification;
use paybridge::gateways::models::wxpay::WxpayPayNotification;
use paybridge::gateways::{AlipayProfile, WxpayProfile};
use paybridge::middleware::{RequestId, REQUEST_ID_HEADER};
use paybridge::modules::health;
use paybridge::notifications::{self, NotificationController, NotificationHandler};
use paybridge::signing::SignatureAlgorithm;

#[derive(Default)]
struct RecordingHandler {
    fail: bool,
    seen: Mutex<Vec<String>>,
}

impl RecordingHandler {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    fn record(&self, out_trade_no: String) -> Result<()> {
        self.seen.lock().unwrap().push(out_trade_no);
        if self.fail {
            return Err(AppError::internal("order store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationHandler for RecordingHandler {
    async fn on_wxpay_payment(&self, notification: WxpayPayNotification) -> Result<()> {
        self.record(notification.out_trade_no)
    }

    async fn on_alipay_payment(&self, notification: AlipayPayNotification) -> Result<()> {
        self.record(notification.out_trade_no)
    }
}

fn full_controller(handler: Arc<RecordingHandler>) -> NotificationController {
    NotificationController::new(handler)
        .with_wxpay(Arc::new(WxpayProfile::new(&wxpay_config(None)).unwrap()))
        .with_alipay(Arc::new(AlipayProfile::new(&alipay_config(true)).unwrap()))
}

fn wxpay_paid() -> Vec<u8> {
    wxpay_signed_xml(
        &[
            ("return_code", "SUCCESS"),
            ("result_code", "SUCCESS"),
            ("mch_id", WXPAY_MCH_ID),
            ("out_trade_no", "1409811653"),
            ("transaction_id", "1004400740201409030005092168"),
            ("total_fee", "101"),
        ],
        SignatureAlgorithm::Md5,
    )
}

fn alipay_paid() -> Vec<u8> {
    alipay_signed_notification(&[
        ("app_id", ALIPAY_APP_ID),
        ("out_trade_no", "6823789339978248"),
        ("trade_no", "2013112011001004330000121536"),
        ("trade_status", "TRADE_SUCCESS"),
        ("total_amount", "20.00"),
        ("sign_type", "RSA2"),
    ])
}

macro_rules! app {
    ($controller:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestId)
                .app_data(web::Data::new($controller))
                .configure(health::configure)
                .configure(notifications::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_wxpay_notification_acknowledged() {
    let handler = Arc::new(RecordingHandler::default());
    let app = app!(full_controller(handler.clone()));

    let req = test::TestRequest::post()
        .uri("/notify/wxpay")
        .insert_header(("content-type", "text/xml"))
        .set_payload(wxpay_paid())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
    let body = test::read_body(resp).await;
    let body = std::str::from_utf8(&body).unwrap();
    assert!(body.contains("<![CDATA[SUCCESS]]>"));
    assert_eq!(handler.seen(), vec!["1409811653".to_string()]);
}

#[actix_web::test]
async fn test_wxpay_forged_notification_never_reaches_handler() {
    let handler = Arc::new(RecordingHandler::default());
    let app = app!(full_controller(handler.clone()));

    let forged = String::from_utf8(wxpay_paid())
        .unwrap()
        .replace("101", "1");
    let req = test::TestRequest::post()
        .uri("/notify/wxpay")
        .set_payload(forged)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body = test::read_body(resp).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("<![CDATA[FAIL]]>"));
    assert!(handler.seen().is_empty());
}

#[actix_web::test]
async fn test_alipay_notification_acknowledged() {
    let handler = Arc::new(RecordingHandler::default());
    let app = app!(full_controller(handler.clone()));

    let req = test::TestRequest::post()
        .uri("/notify/alipay")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload(alipay_paid())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    assert_eq!(test::read_body(resp).await, "success");
    assert_eq!(handler.seen(), vec!["6823789339978248".to_string()]);
}

#[actix_web::test]
async fn test_alipay_unsigned_notification_fails() {
    let handler = Arc::new(RecordingHandler::default());
    let app = app!(full_controller(handler.clone()));

    let req = test::TestRequest::post()
        .uri("/notify/alipay")
        .set_payload("out_trade_no=6823789339978248&trade_status=TRADE_SUCCESS")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    assert_eq!(test::read_body(resp).await, "fail");
    assert!(handler.seen().is_empty());
}

#[actix_web::test]
async fn test_handler_failure_is_acknowledged_as_failure() {
    let handler = Arc::new(RecordingHandler::failing());
    let app = app!(full_controller(handler.clone()));

    let req = test::TestRequest::post()
        .uri("/notify/alipay")
        .set_payload(alipay_paid())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    assert_eq!(test::read_body(resp).await, "fail");
    assert_eq!(handler.seen().len(), 1);
}

#[actix_web::test]
async fn test_unconfigured_gateway_is_not_found() {
    let handler = Arc::new(RecordingHandler::default());
    let controller = NotificationController::new(handler.clone())
        .with_wxpay(Arc::new(WxpayProfile::new(&wxpay_config(None)).unwrap()));
    let app = app!(controller);

    let req = test::TestRequest::post()
        .uri("/notify/alipay")
        .set_payload(alipay_paid())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 404);
    assert!(handler.seen().is_empty());
}

#[actix_web::test]
async fn test_health_lists_configured_gateways() {
    let app = app!(full_controller(Arc::new(RecordingHandler::default())));

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: health::controllers::HealthResponse = test::read_body_json(resp).await;
    assert_eq!(body.status, "healthy");
    assert_eq!(body.gateways, vec!["wxpay".to_string(), "alipay".to_string()]);
}
