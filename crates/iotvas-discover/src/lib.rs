//! iotvas-discover: IoT device discovery and asset tag sync.
//!
//! Wraps nmap with the `iotvas-features` script to fingerprint hosts, asks
//! IoTVAS what each device is and how risky its firmware is, and reconciles
//! the resulting tags onto the matching Qualys host assets.

pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod nmap_xml;
pub mod pipeline;
pub mod reconcile;
pub mod scanner;
pub mod tags;
