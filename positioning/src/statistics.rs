use crate::errors::{PositioningError, Result};

/// 有状态的统计量计算
pub trait ComputeStatistics: Send {
    /// 加入新样本，返回更新后的统计值
    fn add_new_value(&mut self, value: f64) -> f64;
}

/// 指数加权移动平均，首个样本直接作为初始值
#[derive(Debug, Clone)]
pub struct EwmaStatisticCalculator {
    alpha: f64,
    latest: Option<f64>,
}

impl EwmaStatisticCalculator {
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(PositioningError::InvalidParameter {
                message: format!("ewma alpha must be in (0, 1], got {}", alpha),
            });
        }
        Ok(Self {
            alpha,
            latest: None,
        })
    }

    /// alpha = 2 / (periods + 1)
    pub fn with_periods(periods: u32) -> Result<Self> {
        if periods == 0 {
            return Err(PositioningError::InvalidParameter {
                message: "ewma periods must be greater than 0".to_string(),
            });
        }
        Self::new(2.0 / (periods as f64 + 1.0))
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn latest(&self) -> Option<f64> {
        self.latest
    }
}

impl ComputeStatistics for EwmaStatisticCalculator {
    fn add_new_value(&mut self, value: f64) -> f64 {
        let next = match self.latest {
            Some(previous) => self.alpha * value + (1.0 - self.alpha) * previous,
            None => value,
        };
        self.latest = Some(next);
        next
    }
}
