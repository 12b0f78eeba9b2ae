use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Result};

/// `code` of a successful Alipay call
pub const ALIPAY_SUCCESS_CODE: &str = "10000";

pub const METHOD_TRADE_PRECREATE: &str = "alipay.trade.precreate";
pub const METHOD_TRADE_QUERY: &str = "alipay.trade.query";
pub const METHOD_TRADE_REFUND: &str = "alipay.trade.refund";
pub const METHOD_TRADE_PAGE_PAY: &str = "alipay.trade.page.pay";
pub const METHOD_TRADE_WAP_PAY: &str = "alipay.trade.wap.pay";

/// `trade_status` values
pub mod trade_status {
    pub const WAIT_BUYER_PAY: &str = "WAIT_BUYER_PAY";
    pub const TRADE_CLOSED: &str = "TRADE_CLOSED";
    pub const TRADE_SUCCESS: &str = "TRADE_SUCCESS";
    pub const TRADE_FINISHED: &str = "TRADE_FINISHED";
}

/// Redirect-based checkout flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePayKind {
    Web,
    Wap,
}

impl PagePayKind {
    pub fn method(&self) -> &'static str {
        match self {
            PagePayKind::Web => METHOD_TRADE_PAGE_PAY,
            PagePayKind::Wap => METHOD_TRADE_WAP_PAY,
        }
    }

    pub fn product_code(&self) -> &'static str {
        match self {
            PagePayKind::Web => "FAST_INSTANT_TRADE_PAY",
            PagePayKind::Wap => "QUICK_WAP_WAY",
        }
    }
}

/// `alipay.trade.precreate` business content (QR checkout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradePreCreateParams {
    pub out_trade_no: String,
    pub total_amount: Decimal,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discountable_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_pay_channels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_pay_channels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_express: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_order_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_timeout_express: Option<String>,
}

impl TradePreCreateParams {
    pub fn validate(&self) -> Result<()> {
        required(&self.out_trade_no, "out_trade_no")?;
        required(&self.subject, "subject")?;
        validate_amount(self.total_amount, "total_amount")
    }
}

/// `alipay.trade.page.pay` / `alipay.trade.wap.pay` business content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradePagePayParams {
    pub out_trade_no: String,
    pub total_amount: Decimal,
    pub subject: String,
    /// Filled from the checkout kind when left empty
    #[serde(default)]
    pub product_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_express: Option<String>,
    /// WAP only: where the cashier's back button leads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quit_url: Option<String>,
}

impl TradePagePayParams {
    pub fn validate(&self) -> Result<()> {
        required(&self.out_trade_no, "out_trade_no")?;
        required(&self.subject, "subject")?;
        validate_amount(self.total_amount, "total_amount")
    }
}

/// `alipay.trade.query`: one identifier is required
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeQueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_trade_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_pid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_options: Option<Vec<String>>,
}

impl TradeQueryParams {
    pub fn validate(&self) -> Result<()> {
        require_trade_identifier(&self.out_trade_no, &self.trade_no)
    }
}

/// `alipay.trade.refund` business content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeRefundParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_trade_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_no: Option<String>,
    pub refund_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_reason: Option<String>,
    /// Required for partial refunds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_request_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_id: Option<String>,
}

impl TradeRefundParams {
    pub fn validate(&self) -> Result<()> {
        require_trade_identifier(&self.out_trade_no, &self.trade_no)?;
        validate_amount(self.refund_amount, "refund_amount")
    }
}

/// Status block present in every response node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlipayResult {
    pub code: String,
    pub msg: String,
    pub sub_code: String,
    pub sub_msg: String,
}

impl AlipayResult {
    pub fn is_success(&self) -> bool {
        self.code == ALIPAY_SUCCESS_CODE
    }

    /// Protocol error carrying the gateway's own code and message
    pub fn into_error(self) -> AppError {
        let code = if self.sub_code.is_empty() {
            self.code
        } else {
            format!("{}/{}", self.code, self.sub_code)
        };
        let message = if self.sub_msg.is_empty() {
            self.msg
        } else {
            format!("{}: {}", self.msg, self.sub_msg)
        };
        AppError::protocol("alipay", code, message)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradePreCreateResponse {
    #[serde(flatten)]
    pub result: AlipayResult,
    pub out_trade_no: String,
    /// Content to render as the checkout QR code
    pub qr_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeQueryResponse {
    #[serde(flatten)]
    pub result: AlipayResult,
    pub trade_no: String,
    pub out_trade_no: String,
    pub buyer_logon_id: String,
    pub trade_status: String,
    pub total_amount: String,
    pub receipt_amount: String,
    pub buyer_pay_amount: String,
    pub send_pay_date: String,
    pub buyer_user_id: String,
}

impl TradeQueryResponse {
    pub fn is_paid(&self) -> bool {
        self.trade_status == trade_status::TRADE_SUCCESS
            || self.trade_status == trade_status::TRADE_FINISHED
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeRefundResponse {
    #[serde(flatten)]
    pub result: AlipayResult,
    pub trade_no: String,
    pub out_trade_no: String,
    pub buyer_logon_id: String,
    /// `Y` when this call moved funds
    pub fund_change: String,
    pub refund_fee: String,
    pub gmt_refund_pay: String,
    pub buyer_user_id: String,
}

/// Asynchronous payment notification pushed to `notify_url`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlipayPayNotification {
    pub app_id: String,
    pub sign_type: String,
    pub trade_no: String,
    pub out_trade_no: String,
    pub out_biz_no: String,
    pub trade_status: String,
    pub total_amount: String,
    pub receipt_amount: String,
    pub refund_fee: String,
    pub subject: String,
    pub body: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub notify_id: String,
    pub notify_type: String,
    pub notify_time: String,
    pub charset: String,
    pub gmt_create: String,
    pub gmt_payment: String,
    pub gmt_refund: String,
    pub gmt_close: String,
    pub passback_params: String,
    pub version: String,
}

impl AlipayPayNotification {
    pub fn is_paid(&self) -> bool {
        self.trade_status == trade_status::TRADE_SUCCESS
            || self.trade_status == trade_status::TRADE_FINISHED
    }

    pub fn total_amount(&self) -> Result<Decimal> {
        Decimal::from_str(&self.total_amount)
            .map_err(|e| AppError::decode(format!("invalid total_amount: {}", e)))
    }
}

fn required(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_amount(amount: Decimal, field: &str) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation(format!("{} must be positive", field)));
    }
    if amount.normalize().scale() > 2 {
        return Err(AppError::validation(format!(
            "{} has more than two decimal places",
            field
        )));
    }
    Ok(())
}

fn require_trade_identifier(out_trade_no: &Option<String>, trade_no: &Option<String>) -> Result<()> {
    let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
    if blank(out_trade_no) && blank(trade_no) {
        return Err(AppError::validation(
            "either out_trade_no or trade_no is required",
        ));
    }
    Ok(())
}
