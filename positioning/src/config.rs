pub mod positioning_config;
pub use positioning_config::{
    PositioningConfig, ReplayConfig, ResolverConfig, SmootherConfig,
};

use log::info;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file error: {message}")]
    FileError { message: String },
    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

pub struct Config {
    settings: config::Config,
}

impl Config {
    fn load(filepath: &str, format: config::FileFormat) -> Result<Self, ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(filepath).format(format))
            .build()
            .map(|settings| {
                info!("load config from {}", filepath);
                Config { settings }
            })
            .map_err(|e| ConfigError::FileError {
                message: e.to_string(),
            })
    }

    pub fn from_json(filepath: &str) -> Result<Self, ConfigError> {
        Self::load(filepath, config::FileFormat::Json)
    }

    pub fn from_yaml(filepath: &str) -> Result<Self, ConfigError> {
        Self::load(filepath, config::FileFormat::Yaml)
    }

    pub fn from_toml(filepath: &str) -> Result<Self, ConfigError> {
        Self::load(filepath, config::FileFormat::Toml)
    }

    pub fn get<'de, T: Deserialize<'de>>(&self, key: &str) -> Result<T, ConfigError> {
        self.settings
            .get::<T>(key)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
    }

    /// key 不存在时返回 None，格式错误仍然报错
    pub fn get_optional<'de, T: Deserialize<'de>>(
        &self,
        key: &str,
    ) -> Result<Option<T>, ConfigError> {
        match self.settings.get::<T>(key) {
            Ok(value) => Ok(Some(value)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(ConfigError::ParseError {
                message: e.to_string(),
            }),
        }
    }
}
