use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 公允价格
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FairValue {
    pub price: f64,
    pub timestamp: u64,
}

impl FairValue {
    pub fn new(price: f64, timestamp: u64) -> Self {
        Self { price, timestamp }
    }
}

/// EWMA 图表快照
/// 所有价格按最小价格变动单位取整，尚未计算出的字段为 None
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EwmaChart {
    pub quote_ewma: Option<Decimal>,
    pub short_ewma: Option<Decimal>,
    pub long_ewma: Option<Decimal>,
    pub fair_value: Option<Decimal>,
    pub timestamp: u64,
}

/// 定期采样的公允价格
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegularFairValue {
    pub timestamp: u64,
    pub price: f64,
}
