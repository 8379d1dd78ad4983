use crate::{
    event::Event,
    models::{FairValue, PositionReport, QuotingParameters},
};

pub trait FairValueSource: Send + Sync {
    /// 最新公允价格，尚未计算出时为 None
    fn latest_fair_value(&self) -> Option<FairValue>;
}

pub trait PositionBroker: Send + Sync {
    /// 最新持仓报告
    fn latest_report(&self) -> Option<PositionReport>;

    /// 新持仓报告事件
    fn new_report(&self) -> &Event;
}

pub trait QuotingParametersSource: Send + Sync {
    /// 当前生效的报价参数
    fn latest(&self) -> Option<QuotingParameters>;

    /// 报价参数变更事件
    fn new_parameters(&self) -> &Event;
}
