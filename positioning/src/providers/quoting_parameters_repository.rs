use crate::{event::Event, models::QuotingParameters, providers::QuotingParametersSource};
use arc_swap::ArcSwap;
use log::info;
use std::sync::Arc;

/// 报价参数仓库
pub struct QuotingParametersRepository {
    latest: ArcSwap<Option<QuotingParameters>>,
    new_parameters: Event,
}

impl QuotingParametersRepository {
    pub fn new(initial: Option<QuotingParameters>) -> Self {
        Self {
            latest: ArcSwap::from_pointee(initial),
            new_parameters: Event::new(),
        }
    }

    pub fn update(&self, params: QuotingParameters) {
        info!("new quoting parameters: {:?}", params);
        self.latest.store(Arc::new(Some(params)));
        self.new_parameters.trigger();
    }
}

impl Default for QuotingParametersRepository {
    fn default() -> Self {
        Self::new(None)
    }
}

impl QuotingParametersSource for QuotingParametersRepository {
    fn latest(&self) -> Option<QuotingParameters> {
        (**self.latest.load()).clone()
    }

    fn new_parameters(&self) -> &Event {
        &self.new_parameters
    }
}
