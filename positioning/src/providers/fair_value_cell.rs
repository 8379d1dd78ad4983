use crate::{models::FairValue, providers::FairValueSource};
use arc_swap::ArcSwap;

/// 由上游公允价格引擎写入的最新值
pub struct FairValueCell {
    latest: ArcSwap<Option<FairValue>>,
}

impl FairValueCell {
    pub fn new() -> Self {
        Self {
            latest: ArcSwap::from_pointee(None),
        }
    }

    pub fn update(&self, fair_value: FairValue) {
        self.latest.store(std::sync::Arc::new(Some(fair_value)));
    }

    pub fn clear(&self) {
        self.latest.store(std::sync::Arc::new(None));
    }
}

impl Default for FairValueCell {
    fn default() -> Self {
        Self::new()
    }
}

impl FairValueSource for FairValueCell {
    fn latest_fair_value(&self) -> Option<FairValue> {
        **self.latest.load()
    }
}
