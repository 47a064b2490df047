//! Error types for the iotvas-discover crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Nmap not found at path: {path}")]
    NmapNotFound { path: String },

    #[error("Nmap exited with code {code}: {stderr}")]
    NmapFailed { code: i32, stderr: String },

    #[error("Failed to parse nmap XML output: {0}")]
    XmlParse(String),

    #[error("No scan targets in {}", path.display())]
    NoTargets { path: PathBuf },

    #[error("Failed to resolve parent tag {name}: {source}")]
    ParentTag {
        name: String,
        #[source]
        source: iotvas_assets::AssetError,
    },

    #[error("Asset API error: {0}")]
    Assets(#[from] iotvas_assets::AssetError),

    #[error("IoTVAS API error: {0}")]
    Intel(#[from] iotvas_intel::IntelError),

    #[error("Config error: {0}")]
    Config(#[from] iotvas_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DiscoverError>;
