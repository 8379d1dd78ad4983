pub mod signal_smoother;
pub mod target_position_resolver;

pub use signal_smoother::{SignalSmoother, SmootherSchedule, compute_bias};
pub use target_position_resolver::{TargetPositionResolver, compute_target_base_position};

#[cfg(test)]
mod signal_smoother_tests;
