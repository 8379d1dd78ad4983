use crate::{
    event::Event,
    models::{BrokerProfile, EwmaChart, RegularFairValue},
    providers::FairValueSource,
    publish::Publisher,
    statistics::ComputeStatistics,
    utils::round_nearest,
};
use arc_swap::ArcSwap;
use log::{debug, warn};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use time::TimeProvider;

/// 保留的定期公允价格采样数量
pub const REGULAR_FAIR_VALUE_CAPACITY: usize = 7;

/// 定时计算配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmootherSchedule {
    /// 定期计算间隔
    pub tick_interval: Duration,

    /// 启动后首次计算的延迟
    pub warmup_delay: Duration,
}

impl Default for SmootherSchedule {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10 * 60),
            warmup_delay: Duration::from_secs(60),
        }
    }
}

/// 由短期/长期 EWMA 计算归一化偏向，结果限制在 [-1, 1]
///
/// long 为 0 时比值不受保护：short 非 0 得到 ±1，short 也为 0 得到 NaN
pub fn compute_bias(short: f64, long: f64, min_tick: f64) -> f64 {
    let factor = 1.0 / min_tick;
    let bias = ((short * factor / long) - factor) * 5.0;
    bias.clamp(-1.0, 1.0)
}

struct SmootherState {
    new_quote: Option<f64>,
    new_short: Option<f64>,
    new_long: Option<f64>,
    fair_value: Option<f64>,
    short_ewma: Box<dyn ComputeStatistics>,
    long_ewma: Box<dyn ComputeStatistics>,
    data: VecDeque<RegularFairValue>,
}

/// 公允价格平滑与偏向信号
pub struct SignalSmoother {
    profile: BrokerProfile,
    time_provider: Arc<dyn TimeProvider>,
    fv_source: Arc<dyn FairValueSource>,
    publisher: Arc<dyn Publisher<EwmaChart>>,

    state: Mutex<SmootherState>,

    /// 最新偏向，首次越过阈值前为 None
    latest: ArcSwap<Option<f64>>,

    new_target_position: Event,
}

impl SignalSmoother {
    pub fn new(
        profile: BrokerProfile,
        time_provider: Arc<dyn TimeProvider>,
        fv_source: Arc<dyn FairValueSource>,
        short_ewma: Box<dyn ComputeStatistics>,
        long_ewma: Box<dyn ComputeStatistics>,
        publisher: Arc<dyn Publisher<EwmaChart>>,
        schedule: SmootherSchedule,
    ) -> Arc<Self> {
        let smoother = Arc::new(Self {
            profile,
            time_provider: time_provider.clone(),
            fv_source,
            publisher: publisher.clone(),
            state: Mutex::new(SmootherState {
                new_quote: None,
                new_short: None,
                new_long: None,
                fair_value: None,
                short_ewma,
                long_ewma,
                data: VecDeque::with_capacity(REGULAR_FAIR_VALUE_CAPACITY + 1),
            }),
            latest: ArcSwap::from_pointee(None),
            new_target_position: Event::new(),
        });

        let weak = Arc::downgrade(&smoother);
        publisher.register_snapshot(Box::new(move || {
            weak.upgrade().and_then(|smoother| smoother.snapshot())
        }));

        let weak = Arc::downgrade(&smoother);
        time_provider.set_interval(
            Arc::new(move || {
                if let Some(smoother) = weak.upgrade() {
                    smoother.on_periodic_tick();
                }
            }),
            schedule.tick_interval,
        );

        let weak = Arc::downgrade(&smoother);
        time_provider.set_timeout(
            Box::new(move || {
                if let Some(smoother) = weak.upgrade() {
                    smoother.on_periodic_tick();
                }
            }),
            schedule.warmup_delay,
        );

        smoother
    }

    fn lock_state(&self) -> MutexGuard<'_, SmootherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn chart(&self, state: &SmootherState, timestamp: u64) -> EwmaChart {
        let min_tick = self.profile.min_tick_increment;
        EwmaChart {
            quote_ewma: state.new_quote.and_then(|v| round_nearest(v, min_tick)),
            short_ewma: state.new_short.and_then(|v| round_nearest(v, min_tick)),
            long_ewma: state.new_long.and_then(|v| round_nearest(v, min_tick)),
            fair_value: state.fair_value.and_then(|v| round_nearest(v, min_tick)),
            timestamp,
        }
    }

    /// 当前快照，尚无公允价格时为 None
    pub fn snapshot(&self) -> Option<EwmaChart> {
        let state = self.lock_state();
        state.fair_value?;
        Some(self.chart(&state, self.time_provider.utc_now()))
    }

    /// 外部推送的报价 EWMA，只刷新快照，不影响短期/长期 EWMA 和偏向
    pub fn push_quote_ewma(&self, quote_ewma: Option<f64>) {
        let Some(quote_ewma) = quote_ewma else {
            return;
        };
        let Some(fv) = self.fv_source.latest_fair_value() else {
            return;
        };

        let chart = {
            let mut state = self.lock_state();
            state.fair_value = Some(fv.price);
            state.new_quote = Some(quote_ewma);
            self.chart(&state, self.time_provider.utc_now())
        };
        self.publisher.publish(chart);
    }

    /// 定时任务：采样公允价格，更新 EWMA 与偏向
    pub fn on_periodic_tick(&self) {
        let Some(fv) = self.fv_source.latest_fair_value() else {
            debug!("no fair value available, skip ewma update");
            return;
        };

        let now = self.time_provider.utc_now();
        let min_tick = self.profile.min_tick();

        let (bias, changed, chart) = {
            let mut state = self.lock_state();
            state.fair_value = Some(fv.price);

            let new_short = state.short_ewma.add_new_value(fv.price);
            let new_long = state.long_ewma.add_new_value(fv.price);
            state.new_short = Some(new_short);
            state.new_long = Some(new_long);

            let bias = compute_bias(new_short, new_long, min_tick);
            if bias.is_nan() {
                warn!(
                    "degenerate ewma ratio, short: {}, long: {}",
                    new_short, new_long
                );
            }

            // 比较与更新 latest 必须在 state 锁内完成
            let previous = (**self.latest.load()).unwrap_or(0.0);
            let changed = (bias - previous).abs() > min_tick;
            if changed {
                self.latest.store(Arc::new(Some(bias)));
            }

            state.data.push_back(RegularFairValue {
                timestamp: now,
                price: fv.price,
            });
            while state.data.len() > REGULAR_FAIR_VALUE_CAPACITY {
                state.data.pop_front();
            }

            (bias, changed, self.chart(&state, now))
        };

        if changed {
            debug!("new target position bias: {}", bias);
            self.new_target_position.trigger();
        }
        self.publisher.publish(chart);
    }

    /// 最新偏向
    pub fn latest_target_position(&self) -> Option<f64> {
        **self.latest.load()
    }

    /// 最近的定期公允价格采样，按时间顺序
    pub fn regular_fair_values(&self) -> Vec<RegularFairValue> {
        self.lock_state().data.iter().copied().collect()
    }

    /// 偏向变化事件
    pub fn new_target_position(&self) -> &Event {
        &self.new_target_position
    }
}
