use crate::config::Config;
use crate::{
    errors::{PositioningError, Result},
    models::{BrokerProfile, QuotingParameters},
    signal::SmootherSchedule,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_tick_interval_secs() -> u64 {
    600
}

fn default_warmup_delay_secs() -> u64 {
    60
}

fn default_short_ewma_periods() -> u32 {
    9
}

fn default_long_ewma_periods() -> u32 {
    100
}

fn default_params_debounce_millis() -> u64 {
    121
}

fn default_channel_capacity() -> usize {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmootherConfig {
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64, // 定期计算间隔（秒）
    #[serde(default = "default_warmup_delay_secs")]
    pub warmup_delay_secs: u64, // 启动后首次计算延迟（秒）

    #[serde(default = "default_short_ewma_periods")]
    pub short_ewma_periods: u32,
    #[serde(default = "default_long_ewma_periods")]
    pub long_ewma_periods: u32,

    #[serde(default = "default_channel_capacity")]
    pub chart_channel_capacity: usize,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            warmup_delay_secs: default_warmup_delay_secs(),
            short_ewma_periods: default_short_ewma_periods(),
            long_ewma_periods: default_long_ewma_periods(),
            chart_channel_capacity: default_channel_capacity(),
        }
    }
}

impl SmootherConfig {
    pub fn schedule(&self) -> SmootherSchedule {
        SmootherSchedule {
            tick_interval: Duration::from_secs(self.tick_interval_secs),
            warmup_delay: Duration::from_secs(self.warmup_delay_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_params_debounce_millis")]
    pub params_debounce_millis: u64, // 参数变更后延迟重算（毫秒）

    #[serde(default = "default_channel_capacity")]
    pub target_channel_capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            params_debounce_millis: default_params_debounce_millis(),
            target_channel_capacity: default_channel_capacity(),
        }
    }
}

impl ResolverConfig {
    pub fn params_debounce(&self) -> Duration {
        Duration::from_millis(self.params_debounce_millis)
    }
}

/// 回放配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    pub path: String, // csv: timestamp,price
    pub position_value: f64,
}

pub struct PositioningConfig {
    pub broker: BrokerProfile,
    pub smoother: SmootherConfig,
    pub resolver: ResolverConfig,
    pub quoting: Option<QuotingParameters>,
    pub replay: Option<ReplayConfig>,
}

impl PositioningConfig {
    pub fn from_config(config: Config) -> Result<Self> {
        let min_tick_increment: Decimal =
            config
                .get("broker.min_tick_increment")
                .map_err(|e| PositioningError::ConfigError {
                    message: format!("get broker.min_tick_increment err: {}", e),
                })?;
        let broker = BrokerProfile::new(min_tick_increment)?;

        let smoother: SmootherConfig = config
            .get_optional("smoother")
            .map_err(|e| PositioningError::ConfigError {
                message: format!("get smoother err: {}", e),
            })?
            .unwrap_or_default();
        let resolver: ResolverConfig = config
            .get_optional("resolver")
            .map_err(|e| PositioningError::ConfigError {
                message: format!("get resolver err: {}", e),
            })?
            .unwrap_or_default();
        let quoting: Option<QuotingParameters> =
            config
                .get_optional("quoting")
                .map_err(|e| PositioningError::ConfigError {
                    message: format!("get quoting err: {}", e),
                })?;
        let replay: Option<ReplayConfig> =
            config
                .get_optional("replay")
                .map_err(|e| PositioningError::ConfigError {
                    message: format!("get replay err: {}", e),
                })?;

        if smoother.tick_interval_secs == 0 {
            return Err(PositioningError::ConfigError {
                message: "smoother.tick_interval_secs must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            broker,
            smoother,
            resolver,
            quoting,
            replay,
        })
    }
}
