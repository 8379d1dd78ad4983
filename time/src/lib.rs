pub mod time;
pub mod time_provider;
pub mod virtual_time;
pub use time::{get_current_milli_timestamp, get_current_milli_timestamp_u64};
pub use time_provider::{IntervalAction, TimeProvider, TimerAction, TokioTimeProvider};
pub use virtual_time::VirtualTimeProvider;
