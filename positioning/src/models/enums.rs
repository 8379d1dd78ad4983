use serde::{Deserialize, Serialize};

/// 自动目标持仓模式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AutoPositionMode {
    /// 使用配置的固定值或百分比
    #[default]
    Manual,

    /// 使用 EWMA 偏向换算持仓比例
    EwmaBasic,
}
