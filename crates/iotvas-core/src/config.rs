//! Configuration management for the IoTVAS sync.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`IOTVAS_` prefix, `__` between nested keys,
//!    e.g. `IOTVAS_ASSETS__PASSWORD`)
//! 2. Config file (`iotvas.toml`, or the prefix passed on the command line)
//! 3. Defaults
//!
//! Each crate owns the struct for its own section (`[intel]`, `[assets]`,
//! `[discover]`); this module only builds the layered source and pulls
//! sections out of it.

use config::{Config, ConfigError};
use serde::de::DeserializeOwned;

use crate::error::CoreError;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "IOTVAS";

/// Config file name used when none is given.
pub const DEFAULT_FILE_PREFIX: &str = "iotvas";

/// Build the layered configuration: optional file, then environment.
pub fn load_layered(file_prefix: &str) -> Result<Config, CoreError> {
    let cfg = Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(cfg)
}

/// Deserialize one section, falling back to its defaults when absent.
pub fn section<T>(cfg: &Config, key: &str) -> Result<T, CoreError>
where
    T: DeserializeOwned + Default,
{
    match cfg.get::<T>(key) {
        Ok(value) => Ok(value),
        Err(ConfigError::NotFound(_)) => {
            tracing::debug!(section = key, "Config section not set, using defaults");
            Ok(T::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Reject an empty value for a setting that has no usable default.
pub fn require(key: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::MissingSetting {
            key: key.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default)]
        base_url: String,
        #[serde(default)]
        retries: u32,
    }

    #[test]
    fn test_section_from_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("iotvas.toml"),
            "[sample]\nbase_url = \"https://qualys.example\"\nretries = 3\n",
        )
        .unwrap();

        let prefix = dir.path().join("iotvas");
        let cfg = load_layered(prefix.to_str().unwrap()).unwrap();
        let sample: Sample = section(&cfg, "sample").unwrap();
        assert_eq!(sample.base_url, "https://qualys.example");
        assert_eq!(sample.retries, 3);
    }

    #[test]
    fn test_missing_file_and_section_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("does-not-exist");
        let cfg = load_layered(prefix.to_str().unwrap()).unwrap();
        let sample: Sample = section(&cfg, "no_such_section").unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_require() {
        assert!(require("intel.api_key", "abc").is_ok());
        let err = require("intel.api_key", "  ").unwrap_err();
        assert!(err.to_string().contains("intel.api_key"));
        assert!(matches!(err, CoreError::MissingSetting { .. }));
    }

    #[test]
    fn test_malformed_section_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("iotvas.toml"), "[sample]\nretries = \"many\"\n").unwrap();

        let prefix = dir.path().join("iotvas");
        let cfg = load_layered(prefix.to_str().unwrap()).unwrap();
        let result: Result<Sample, CoreError> = section(&cfg, "sample");
        assert!(matches!(result, Err(CoreError::Config(_))));
    }
}
