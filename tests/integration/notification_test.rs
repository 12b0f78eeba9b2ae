// Inbound notification validation
//
// - Only signed, verified payloads are mapped into notification types
// - sign_type on the payload must name the configured algorithm
// - Missing signatures and missing verification keys are rejected

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use helpers::*;
use paybridge::core::AppError;
use paybridge::gateways::models::alipay::AlipayPayNotification;
use paybridge::gateways::models::wxpay::WxpayPayNotification;
use paybridge::gateways::services::wire::encode_xml;
use paybridge::gateways::{AlipayProfile, WxpayProfile};
use paybridge::notifications::NotificationValidator;
use paybridge::signing::{SignatureAlgorithm, SIGN_FIELD};

const WXPAY_PAID: &[(&str, &str)] = &[
    ("return_code", "SUCCESS"),
    ("result_code", "SUCCESS"),
    ("appid", WXPAY_APPID),
    ("mch_id", WXPAY_MCH_ID),
    ("nonce_str", "5K8264ILTKCH16CQ2502SI8ZNMTM67VS"),
    ("openid", "oUpF8uMEb4qRXf22hE3X68TekukE"),
    ("trade_type", "NATIVE"),
    ("bank_type", "CFT"),
    ("total_fee", "101"),
    ("cash_fee", "101"),
    ("transaction_id", "1004400740201409030005092168"),
    ("out_trade_no", "1409811653"),
    ("time_end", "20140903131540"),
];

const ALIPAY_PAID: &[(&str, &str)] = &[
    ("app_id", ALIPAY_APP_ID),
    ("notify_id", "ac05099524730693a8b330c5ecf72da9786"),
    ("notify_type", "trade_status_sync"),
    ("notify_time", "2015-04-27 15:45:57"),
    ("trade_no", "2013112011001004330000121536"),
    ("out_trade_no", "6823789339978248"),
    ("trade_status", "TRADE_SUCCESS"),
    ("total_amount", "20.00"),
    ("subject", "iPhone 6 16G"),
    ("charset", "utf-8"),
    ("version", "1.0"),
    ("sign_type", "RSA2"),
];

fn wxpay_validator(sign_type: Option<&str>) -> NotificationValidator<WxpayProfile> {
    NotificationValidator::new(Arc::new(WxpayProfile::new(&wxpay_config(sign_type)).unwrap()))
}

fn alipay_validator(with_public_key: bool) -> NotificationValidator<AlipayProfile> {
    NotificationValidator::new(Arc::new(
        AlipayProfile::new(&alipay_config(with_public_key)).unwrap(),
    ))
}

#[test]
fn test_wxpay_valid_notification() {
    let body = wxpay_signed_xml(WXPAY_PAID, SignatureAlgorithm::Md5);
    let notification: WxpayPayNotification = wxpay_validator(None).validate(&body).unwrap();

    assert!(notification.header.is_success());
    assert_eq!(notification.out_trade_no, "1409811653");
    assert_eq!(notification.transaction_id, "1004400740201409030005092168");
    assert_eq!(notification.total_fee_fen().unwrap(), 101);
}

#[test]
fn test_wxpay_signature_removed_from_fields() {
    let body = wxpay_signed_xml(WXPAY_PAID, SignatureAlgorithm::Md5);
    let params = wxpay_validator(None).validate_params(&body).unwrap();
    assert!(!params.contains_key(SIGN_FIELD));
    assert_eq!(params["openid"], "oUpF8uMEb4qRXf22hE3X68TekukE");
}

#[test]
fn test_wxpay_tampered_amount_rejected() {
    let mut params = paybridge::core::params::from_pairs(WXPAY_PAID.iter().copied());
    wxpay_sign_params(&mut params, SignatureAlgorithm::Md5);
    params.insert("total_fee".into(), "1".into());
    let body = encode_xml(&params).unwrap();

    let err = wxpay_validator(None)
        .validate::<WxpayPayNotification>(&body)
        .unwrap_err();
    assert!(matches!(err, AppError::Signature(_)));
    assert!(err.is_security_event());
}

#[test]
fn test_wxpay_sign_type_matching_configuration_accepted() {
    let mut fields = WXPAY_PAID.to_vec();
    fields.push(("sign_type", "HMAC-SHA256"));
    let body = wxpay_signed_xml(&fields, SignatureAlgorithm::HmacSha256);

    assert!(wxpay_validator(Some("HMAC-SHA256")).validate_params(&body).is_ok());
}

#[test]
fn test_wxpay_payload_cannot_downgrade_to_md5() {
    let mut fields = WXPAY_PAID.to_vec();
    fields.push(("sign_type", "MD5"));
    let body = wxpay_signed_xml(&fields, SignatureAlgorithm::Md5);

    let err = wxpay_validator(Some("HMAC-SHA256"))
        .validate_params(&body)
        .unwrap_err();
    assert!(matches!(err, AppError::Signature(_)));
    assert!(err.is_security_event());
}

#[test]
fn test_wxpay_payload_cannot_switch_from_md5() {
    let mut fields = WXPAY_PAID.to_vec();
    fields.push(("sign_type", "HMAC-SHA256"));
    let body = wxpay_signed_xml(&fields, SignatureAlgorithm::HmacSha256);

    assert!(matches!(
        wxpay_validator(None).validate_params(&body),
        Err(AppError::Signature(_))
    ));
}

#[test]
fn test_wxpay_hmac_configured_rejects_md5_signature() {
    let body = wxpay_signed_xml(WXPAY_PAID, SignatureAlgorithm::Md5);
    let err = wxpay_validator(Some("HMAC-SHA256"))
        .validate_params(&body)
        .unwrap_err();
    assert!(matches!(err, AppError::Signature(_)));
}

#[test]
fn test_wxpay_missing_sign_rejected() {
    let params = paybridge::core::params::from_pairs(WXPAY_PAID.iter().copied());
    let body = encode_xml(&params).unwrap();

    assert!(matches!(
        wxpay_validator(None).validate_params(&body),
        Err(AppError::Signature(_))
    ));
}

#[test]
fn test_wxpay_malformed_body_is_decode_error() {
    assert!(matches!(
        wxpay_validator(None).validate_params(b"not xml at all"),
        Err(AppError::Decode(_))
    ));
}

#[test]
fn test_alipay_valid_notification() {
    let body = alipay_signed_notification(ALIPAY_PAID);
    let notification: AlipayPayNotification = alipay_validator(true).validate(&body).unwrap();

    assert!(notification.is_paid());
    assert_eq!(notification.trade_no, "2013112011001004330000121536");
    assert_eq!(notification.sign_type, "RSA2");
    assert_eq!(
        notification.total_amount().unwrap(),
        rust_decimal_macros::dec!(20.00)
    );
}

#[test]
fn test_alipay_tampered_status_rejected() {
    let body = String::from_utf8(alipay_signed_notification(ALIPAY_PAID)).unwrap();
    let tampered = body.replace("TRADE_SUCCESS", "TRADE_FINISHED");

    assert!(matches!(
        alipay_validator(true).validate_params(tampered.as_bytes()),
        Err(AppError::Signature(_))
    ));
}

#[test]
fn test_alipay_without_public_key_rejects_everything() {
    let body = alipay_signed_notification(ALIPAY_PAID);
    assert!(matches!(
        alipay_validator(false).validate_params(&body),
        Err(AppError::Signature(_))
    ));
}

#[test]
fn test_alipay_mac_sign_type_rejected() {
    let mut fields = ALIPAY_PAID.to_vec();
    fields.retain(|(k, _)| *k != "sign_type");
    fields.push(("sign_type", "MD5"));
    let body = alipay_signed_notification(&fields);

    assert!(matches!(
        alipay_validator(true).validate_params(&body),
        Err(AppError::Signature(_))
    ));
}

#[test]
fn test_alipay_payload_cannot_downgrade_to_rsa() {
    let mut fields = ALIPAY_PAID.to_vec();
    fields.retain(|(k, _)| *k != "sign_type");
    fields.push(("sign_type", "RSA"));
    let body = alipay_signed_notification(&fields);

    assert!(matches!(
        alipay_validator(true).validate_params(&body),
        Err(AppError::Signature(_))
    ));
}

#[test]
fn test_alipay_missing_sign_rejected() {
    let body = serde_urlencoded::to_string(ALIPAY_PAID).unwrap();
    assert!(matches!(
        alipay_validator(true).validate_params(body.as_bytes()),
        Err(AppError::Signature(_))
    ));
}

#[test]
fn test_acknowledgements() {
    assert_eq!(alipay_validator(false).ack_success(), "success");
    assert_eq!(alipay_validator(false).ack_failure(Some("bad")), "fail");

    let wxpay = wxpay_validator(None);
    let ok = wxpay.ack_success();
    assert!(ok.contains("<return_code><![CDATA[SUCCESS]]></return_code>"));
    assert!(ok.contains("<return_msg><![CDATA[OK]]></return_msg>"));

    let failed = wxpay.ack_failure(Some("signature ]]> mismatch"));
    assert!(failed.contains("<return_code><![CDATA[FAIL]]></return_code>"));
    assert!(!failed.contains("signature ]]> mismatch"));
}
