pub mod config;
pub mod errors;
pub mod event;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod publish;
pub mod replay;
pub mod signal;
pub mod statistics;
pub mod utils;
