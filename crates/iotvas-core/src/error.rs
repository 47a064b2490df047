use thiserror::Error;

/// Top-level error type shared by the IoTVAS sync crates.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Missing required setting: {key}")]
    MissingSetting { key: String },
}
