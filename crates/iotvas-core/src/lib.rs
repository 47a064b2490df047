//! iotvas-core: Shared types, configuration, and error handling for the IoTVAS asset tag sync.
//!
//! This crate provides the foundational types used across all components:
//! - Tag and host asset types as the asset inventory reports them
//! - Device, firmware, and risk types as the device-intelligence API reports them
//! - Layered configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use error::CoreError;
pub use types::{
    tag_category, AssetId, CryptoKey, DefaultAccount, DeviceFeatures, DeviceInfo, FirmwareInfo,
    FirmwareIntel, FirmwareRisk, HostAsset, RiskSummary, Tag, TagId, VulnerableComponent,
    Vulnerability, WeakCert,
};
