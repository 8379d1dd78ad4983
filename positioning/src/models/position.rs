use crate::{
    errors::{PositioningError, Result},
    models::AutoPositionMode,
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

/// 持仓报告
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    /// 当前持仓价值（计价货币）
    pub value: f64,
    pub timestamp: u64,
}

/// 目标基础货币持仓
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetBasePositionValue {
    pub data: f64,
    pub side_apr: Vec<String>,
    pub timestamp: u64,
}

fn default_target_base_position_percentage() -> f64 {
    50.0
}

/// 报价参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotingParameters {
    #[serde(default)]
    pub target_base_position: f64,

    // true 时按当前持仓价值的百分比计算目标
    #[serde(default)]
    pub percentage_values: bool,

    #[serde(default = "default_target_base_position_percentage")]
    pub target_base_position_percentage: f64,

    #[serde(default)]
    pub auto_position_mode: AutoPositionMode,
}

impl Default for QuotingParameters {
    fn default() -> Self {
        Self {
            target_base_position: 0.0,
            percentage_values: false,
            target_base_position_percentage: default_target_base_position_percentage(),
            auto_position_mode: AutoPositionMode::Manual,
        }
    }
}

/// 交易所标的属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerProfile {
    /// 最小价格变动单位
    pub min_tick_increment: Decimal,
}

impl BrokerProfile {
    pub fn new(min_tick_increment: Decimal) -> Result<Self> {
        if min_tick_increment <= Decimal::ZERO {
            return Err(PositioningError::InvalidParameter {
                message: format!(
                    "min_tick_increment must be positive, got {}",
                    min_tick_increment
                ),
            });
        }
        Ok(Self { min_tick_increment })
    }

    pub fn min_tick(&self) -> f64 {
        self.min_tick_increment.to_f64().unwrap_or(f64::MIN_POSITIVE)
    }
}
