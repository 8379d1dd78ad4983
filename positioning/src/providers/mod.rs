pub mod fair_value_cell;
pub mod position_report_store;
pub mod quoting_parameters_repository;
pub mod traits;

pub use fair_value_cell::FairValueCell;
pub use position_report_store::PositionReportStore;
pub use quoting_parameters_repository::QuotingParametersRepository;
pub use traits::{FairValueSource, PositionBroker, QuotingParametersSource};
