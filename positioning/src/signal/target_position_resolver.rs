use crate::{
    event::Event,
    models::{AutoPositionMode, QuotingParameters, TargetBasePositionValue},
    providers::{PositionBroker, QuotingParametersSource},
    publish::Publisher,
    signal::SignalSmoother,
};
use arc_swap::ArcSwap;
use log::{debug, info};
use std::{
    sync::{Arc, Mutex, PoisonError, RwLock, Weak},
    time::Duration,
};
use time::TimeProvider;

/// 目标持仓变化阈值，小于等于该值不重新发布
pub const TARGET_CHANGE_TOLERANCE: f64 = 1e-2;

/// 报价参数变更后延迟重算的默认时间
pub const DEFAULT_PARAMS_DEBOUNCE: Duration = Duration::from_millis(121);

/// 计算目标基础货币持仓
/// bias 尚未产生时按 0 处理
pub fn compute_target_base_position(
    params: &QuotingParameters,
    position_value: f64,
    bias: Option<f64>,
) -> f64 {
    if params.auto_position_mode == AutoPositionMode::EwmaBasic {
        return ((1.0 + bias.unwrap_or(0.0)) / 2.0) * position_value;
    }
    if params.percentage_values {
        params.target_base_position_percentage * position_value / 100.0
    } else {
        params.target_base_position
    }
}

/// 目标持仓计算
/// 持仓报告、报价参数、偏向信号任一变化时重算，超过阈值才发布
pub struct TargetPositionResolver {
    time_provider: Arc<dyn TimeProvider>,
    signal_smoother: Arc<SignalSmoother>,
    params: Arc<dyn QuotingParametersSource>,
    position_broker: Arc<dyn PositionBroker>,
    publisher: Arc<dyn Publisher<TargetBasePositionValue>>,
    params_debounce: Duration,

    side_apr: RwLock<Vec<String>>,
    latest: ArcSwap<Option<TargetBasePositionValue>>,

    // 重算串行执行：读取输入、比较、更新 latest 在同一临界区内
    recompute_lock: Mutex<()>,

    new_target_position: Event,
}

impl TargetPositionResolver {
    pub fn new(
        time_provider: Arc<dyn TimeProvider>,
        signal_smoother: Arc<SignalSmoother>,
        params: Arc<dyn QuotingParametersSource>,
        position_broker: Arc<dyn PositionBroker>,
        publisher: Arc<dyn Publisher<TargetBasePositionValue>>,
        params_debounce: Duration,
    ) -> Arc<Self> {
        let resolver = Arc::new(Self {
            time_provider,
            signal_smoother: signal_smoother.clone(),
            params: params.clone(),
            position_broker: position_broker.clone(),
            publisher: publisher.clone(),
            params_debounce,
            side_apr: RwLock::new(Vec::new()),
            latest: ArcSwap::from_pointee(None),
            recompute_lock: Mutex::new(()),
            new_target_position: Event::new(),
        });

        let weak = Arc::downgrade(&resolver);
        publisher.register_snapshot(Box::new(move || {
            weak.upgrade()
                .and_then(|resolver| resolver.latest_target_position())
        }));

        let weak = Arc::downgrade(&resolver);
        position_broker.new_report().on(move || {
            if let Some(resolver) = weak.upgrade() {
                resolver.recompute_target_position();
            }
        });

        let weak = Arc::downgrade(&resolver);
        params.new_parameters().on(move || {
            if let Some(resolver) = weak.upgrade() {
                resolver.schedule_recompute();
            }
        });

        let weak = Arc::downgrade(&resolver);
        signal_smoother.new_target_position().on(move || {
            if let Some(resolver) = weak.upgrade() {
                resolver.recompute_target_position();
            }
        });

        resolver
    }

    // 每次参数变更都独立排一次延迟重算，不合并
    fn schedule_recompute(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.time_provider.set_timeout(
            Box::new(move || {
                if let Some(resolver) = weak.upgrade() {
                    resolver.recompute_target_position();
                }
            }),
            self.params_debounce,
        );
    }

    pub fn recompute_target_position(&self) {
        let latest = {
            // 参数、持仓、偏向都在锁内读取，后到的重算总能看到最新输入
            let _guard = self
                .recompute_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            let (Some(params), Some(position)) =
                (self.params.latest(), self.position_broker.latest_report())
            else {
                debug!("quoting parameters or position report unavailable, skip recompute");
                return;
            };

            let target_base_position = compute_target_base_position(
                &params,
                position.value,
                self.signal_smoother.latest_target_position(),
            );
            let side_apr = self.side_apr();

            let changed = match &**self.latest.load() {
                None => true,
                Some(previous) => {
                    (previous.data - target_base_position).abs() > TARGET_CHANGE_TOLERANCE
                        || previous.side_apr != side_apr
                }
            };
            if !changed {
                return;
            }

            let latest = TargetBasePositionValue {
                data: target_base_position,
                side_apr,
                timestamp: self.time_provider.utc_now(),
            };
            self.latest.store(Arc::new(Some(latest.clone())));
            latest
        };

        self.new_target_position.trigger();
        info!("recalculated target base position: {}", latest.data);
        self.publisher.publish(latest);
    }

    /// 外部推送的报价 EWMA，转交给信号平滑器
    pub fn set_quote_ewma(&self, quote_ewma: Option<f64>) {
        self.signal_smoother.push_quote_ewma(quote_ewma);
    }

    pub fn set_side_apr(&self, side_apr: Vec<String>) {
        let mut current = self.side_apr.write().unwrap_or_else(PoisonError::into_inner);
        *current = side_apr;
    }

    pub fn side_apr(&self) -> Vec<String> {
        self.side_apr
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn latest_target_position(&self) -> Option<TargetBasePositionValue> {
        (**self.latest.load()).clone()
    }

    /// 目标持仓变化事件
    pub fn new_target_position(&self) -> &Event {
        &self.new_target_position
    }
}
