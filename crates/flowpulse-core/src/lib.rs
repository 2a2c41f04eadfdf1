use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod keywords;
pub mod metrics;
mod platform;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use metrics::TrendDirection;
pub use platform::{Platform, PlatformParseError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
