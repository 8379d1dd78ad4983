use crate::{event::Event, models::PositionReport, providers::PositionBroker};
use arc_swap::ArcSwap;
use std::sync::Arc;

/// 持仓报告缓存，更新后触发 new_report 事件
pub struct PositionReportStore {
    latest: ArcSwap<Option<PositionReport>>,
    new_report: Event,
}

impl PositionReportStore {
    pub fn new() -> Self {
        Self {
            latest: ArcSwap::from_pointee(None),
            new_report: Event::new(),
        }
    }

    pub fn update(&self, report: PositionReport) {
        self.latest.store(Arc::new(Some(report)));
        self.new_report.trigger();
    }
}

impl Default for PositionReportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionBroker for PositionReportStore {
    fn latest_report(&self) -> Option<PositionReport> {
        **self.latest.load()
    }

    fn new_report(&self) -> &Event {
        &self.new_report
    }
}
