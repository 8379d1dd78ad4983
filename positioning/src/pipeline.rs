use crate::{
    config::PositioningConfig,
    errors::Result,
    models::{EwmaChart, TargetBasePositionValue},
    providers::{FairValueCell, PositionReportStore, QuotingParametersRepository},
    publish::BroadcastPublisher,
    signal::{SignalSmoother, TargetPositionResolver},
    statistics::EwmaStatisticCalculator,
};
use log::info;
use std::sync::Arc;
use time::TimeProvider;

/// 组装好的信号链路：SignalSmoother -> TargetPositionResolver -> 发布
pub struct PositioningPipeline {
    pub fair_values: Arc<FairValueCell>,
    pub positions: Arc<PositionReportStore>,
    pub quoting_parameters: Arc<QuotingParametersRepository>,
    pub chart_publisher: Arc<BroadcastPublisher<EwmaChart>>,
    pub target_publisher: Arc<BroadcastPublisher<TargetBasePositionValue>>,
    pub signal_smoother: Arc<SignalSmoother>,
    pub resolver: Arc<TargetPositionResolver>,
}

impl PositioningPipeline {
    pub fn build(config: &PositioningConfig, time_provider: Arc<dyn TimeProvider>) -> Result<Self> {
        let short_ewma = EwmaStatisticCalculator::with_periods(config.smoother.short_ewma_periods)?;
        let long_ewma = EwmaStatisticCalculator::with_periods(config.smoother.long_ewma_periods)?;

        let fair_values = Arc::new(FairValueCell::new());
        let positions = Arc::new(PositionReportStore::new());
        let quoting_parameters = Arc::new(QuotingParametersRepository::new(config.quoting.clone()));
        let chart_publisher = Arc::new(BroadcastPublisher::new(
            "ewma_chart",
            config.smoother.chart_channel_capacity,
        ));
        let target_publisher = Arc::new(BroadcastPublisher::new(
            "target_base_position",
            config.resolver.target_channel_capacity,
        ));

        let signal_smoother = SignalSmoother::new(
            config.broker,
            time_provider.clone(),
            fair_values.clone(),
            Box::new(short_ewma),
            Box::new(long_ewma),
            chart_publisher.clone(),
            config.smoother.schedule(),
        );
        let resolver = TargetPositionResolver::new(
            time_provider,
            signal_smoother.clone(),
            quoting_parameters.clone(),
            positions.clone(),
            target_publisher.clone(),
            config.resolver.params_debounce(),
        );

        info!(
            "positioning pipeline ready, min_tick_increment: {}, short/long periods: {}/{}",
            config.broker.min_tick_increment,
            config.smoother.short_ewma_periods,
            config.smoother.long_ewma_periods
        );

        Ok(Self {
            fair_values,
            positions,
            quoting_parameters,
            chart_publisher,
            target_publisher,
            signal_smoother,
            resolver,
        })
    }
}
