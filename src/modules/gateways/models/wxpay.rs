use serde::{Deserialize, Serialize};

use crate::core::{AppError, ParameterSet, Result};

pub const WXPAY_SUCCESS: &str = "SUCCESS";
pub const WXPAY_FAIL: &str = "FAIL";

pub const PATH_UNIFIED_ORDER: &str = "/pay/unifiedorder";
pub const PATH_ORDER_QUERY: &str = "/pay/orderquery";
pub const PATH_REFUND: &str = "/secapi/pay/refund";

/// `trade_state` values reported by order query
pub mod trade_state {
    pub const SUCCESS: &str = "SUCCESS";
    pub const REFUND: &str = "REFUND";
    pub const NOTPAY: &str = "NOTPAY";
    pub const CLOSED: &str = "CLOSED";
    pub const REVOKED: &str = "REVOKED";
    pub const USERPAYING: &str = "USERPAYING";
    pub const PAYERROR: &str = "PAYERROR";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    /// QR code scanned by the payer
    #[default]
    Native,
    /// In-browser (official account / mini program)
    Jsapi,
    App,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Native => "NATIVE",
            TradeType::Jsapi => "JSAPI",
            TradeType::App => "APP",
        }
    }
}

/// Store information sent as the JSON `scene_info` field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneInfo {
    pub id: String,
    pub name: String,
    pub area_code: String,
    pub address: String,
}

/// Unified order request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnifiedOrderParams {
    pub appid: String,
    pub trade_type: TradeType,
    pub out_trade_no: String,
    /// Amount in fen
    pub total_fee: i64,
    pub body: String,
    pub spbill_create_ip: String,
    /// Required for NATIVE
    pub product_id: Option<String>,
    /// Required for JSAPI
    pub openid: Option<String>,
    pub detail: Option<String>,
    pub fee_type: Option<String>,
    pub device_info: Option<String>,
    pub attach: Option<String>,
    pub time_start: Option<String>,
    pub time_expire: Option<String>,
    pub goods_tag: Option<String>,
    pub limit_pay: Option<String>,
    pub receipt: Option<String>,
    pub scene_info: Option<SceneInfo>,
}

impl UnifiedOrderParams {
    pub fn validate(&self) -> Result<()> {
        required(&self.appid, "appid")?;
        required(&self.body, "body")?;
        required(&self.out_trade_no, "out_trade_no")?;
        required(&self.spbill_create_ip, "spbill_create_ip")?;
        if self.total_fee <= 0 {
            return Err(AppError::validation("total_fee must be greater than 0"));
        }
        match self.trade_type {
            TradeType::Native => required_opt(&self.product_id, "product_id (NATIVE)"),
            TradeType::Jsapi => required_opt(&self.openid, "openid (JSAPI)"),
            TradeType::App => Ok(()),
        }
    }

    /// Flatten into wire fields; empty optionals are dropped at signing time
    pub fn into_parameters(self, notify_url: &str) -> Result<ParameterSet> {
        let scene_info = match &self.scene_info {
            Some(scene) => Some(serde_json::to_string(&serde_json::json!({ "store_info": scene }))?),
            None => None,
        };

        let mut params = ParameterSet::new();
        params.insert("appid".into(), self.appid);
        params.insert("trade_type".into(), self.trade_type.as_str().into());
        params.insert("out_trade_no".into(), self.out_trade_no);
        params.insert("total_fee".into(), self.total_fee.to_string());
        params.insert("body".into(), self.body);
        params.insert("spbill_create_ip".into(), self.spbill_create_ip);
        params.insert("notify_url".into(), notify_url.to_string());
        insert_opt(&mut params, "product_id", self.product_id);
        insert_opt(&mut params, "openid", self.openid);
        insert_opt(&mut params, "detail", self.detail);
        insert_opt(&mut params, "fee_type", self.fee_type);
        insert_opt(&mut params, "device_info", self.device_info);
        insert_opt(&mut params, "attach", self.attach);
        insert_opt(&mut params, "time_start", self.time_start);
        insert_opt(&mut params, "time_expire", self.time_expire);
        insert_opt(&mut params, "goods_tag", self.goods_tag);
        insert_opt(&mut params, "limit_pay", self.limit_pay);
        insert_opt(&mut params, "receipt", self.receipt);
        insert_opt(&mut params, "scene_info", scene_info);
        Ok(params)
    }
}

/// Order query: one of the two identifiers is required
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryParams {
    pub appid: String,
    pub out_trade_no: Option<String>,
    pub transaction_id: Option<String>,
}

impl OrderQueryParams {
    pub fn validate(&self) -> Result<()> {
        required(&self.appid, "appid")?;
        if is_blank(&self.out_trade_no) && is_blank(&self.transaction_id) {
            return Err(AppError::validation(
                "either out_trade_no or transaction_id is required",
            ));
        }
        Ok(())
    }

    pub fn into_parameters(self) -> ParameterSet {
        let mut params = ParameterSet::new();
        params.insert("appid".into(), self.appid);
        insert_opt(&mut params, "out_trade_no", self.out_trade_no);
        insert_opt(&mut params, "transaction_id", self.transaction_id);
        params
    }
}

/// Refund request; amounts in fen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefundParams {
    pub appid: String,
    pub out_trade_no: Option<String>,
    pub transaction_id: Option<String>,
    pub out_refund_no: String,
    pub total_fee: i64,
    pub refund_fee: i64,
    pub refund_fee_type: Option<String>,
    pub refund_desc: Option<String>,
}

impl RefundParams {
    pub fn validate(&self) -> Result<()> {
        required(&self.appid, "appid")?;
        required(&self.out_refund_no, "out_refund_no")?;
        if is_blank(&self.out_trade_no) && is_blank(&self.transaction_id) {
            return Err(AppError::validation(
                "either out_trade_no or transaction_id is required",
            ));
        }
        if self.total_fee <= 0 || self.refund_fee <= 0 {
            return Err(AppError::validation("total_fee and refund_fee must be positive"));
        }
        if self.refund_fee > self.total_fee {
            return Err(AppError::validation("refund_fee exceeds total_fee"));
        }
        Ok(())
    }

    pub fn into_parameters(self, notify_url: &str) -> ParameterSet {
        let mut params = ParameterSet::new();
        params.insert("appid".into(), self.appid);
        params.insert("out_refund_no".into(), self.out_refund_no);
        params.insert("total_fee".into(), self.total_fee.to_string());
        params.insert("refund_fee".into(), self.refund_fee.to_string());
        params.insert("notify_url".into(), notify_url.to_string());
        insert_opt(&mut params, "out_trade_no", self.out_trade_no);
        insert_opt(&mut params, "transaction_id", self.transaction_id);
        insert_opt(&mut params, "refund_fee_type", self.refund_fee_type);
        insert_opt(&mut params, "refund_desc", self.refund_desc);
        params
    }
}

/// Status and identity fields present on every response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WxpayResultHeader {
    pub return_code: String,
    pub return_msg: String,
    pub result_code: String,
    pub err_code: String,
    pub err_code_des: String,
    pub appid: String,
    pub mch_id: String,
    pub nonce_str: String,
    pub sign: String,
    pub sign_type: String,
    pub device_info: String,
}

impl WxpayResultHeader {
    pub fn is_success(&self) -> bool {
        self.return_code == WXPAY_SUCCESS && self.result_code == WXPAY_SUCCESS
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnifiedOrderResponse {
    #[serde(flatten)]
    pub header: WxpayResultHeader,
    pub trade_type: String,
    pub prepay_id: String,
    /// QR payload for NATIVE orders
    pub code_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderQueryResponse {
    #[serde(flatten)]
    pub header: WxpayResultHeader,
    pub openid: String,
    pub is_subscribe: String,
    pub trade_type: String,
    pub trade_state: String,
    pub trade_state_desc: String,
    pub bank_type: String,
    pub total_fee: String,
    pub settlement_total_fee: String,
    pub fee_type: String,
    pub cash_fee: String,
    pub cash_fee_type: String,
    pub transaction_id: String,
    pub out_trade_no: String,
    pub attach: String,
    pub time_end: String,
}

impl OrderQueryResponse {
    pub fn is_paid(&self) -> bool {
        self.trade_state == trade_state::SUCCESS
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundResponse {
    #[serde(flatten)]
    pub header: WxpayResultHeader,
    pub transaction_id: String,
    pub out_trade_no: String,
    pub out_refund_no: String,
    pub refund_id: String,
    pub refund_fee: String,
    pub settlement_refund_fee: String,
    pub total_fee: String,
    pub cash_fee: String,
}

/// Payment result pushed to `pay_notify_url`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WxpayPayNotification {
    #[serde(flatten)]
    pub header: WxpayResultHeader,
    pub openid: String,
    pub is_subscribe: String,
    pub trade_type: String,
    pub bank_type: String,
    pub total_fee: String,
    pub settlement_total_fee: String,
    pub fee_type: String,
    pub cash_fee: String,
    pub cash_fee_type: String,
    pub transaction_id: String,
    pub out_trade_no: String,
    pub attach: String,
    pub time_end: String,
}

impl WxpayPayNotification {
    /// Amount paid in fen
    pub fn total_fee_fen(&self) -> Result<i64> {
        self.total_fee
            .parse()
            .map_err(|_| AppError::decode(format!("invalid total_fee: {}", self.total_fee)))
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn required(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(())
}

fn required_opt(value: &Option<String>, field: &str) -> Result<()> {
    if is_blank(value) {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(())
}

fn insert_opt(params: &mut ParameterSet, key: &str, value: Option<String>) {
    if let Some(value) = value {
        params.insert(key.to_string(), value);
    }
}
