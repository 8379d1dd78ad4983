use thiserror::Error;

#[derive(Debug, Error)]
pub enum PositioningError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Replay error: {message}")]
    ReplayError { message: String },
}

pub type Result<T> = std::result::Result<T, PositioningError>;
