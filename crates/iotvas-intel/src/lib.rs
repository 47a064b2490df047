//! IoTVAS Intel: device-intelligence API client.
//!
//! Turns the fingerprint features collected by a scan into device identity,
//! and a firmware hash into its risk, default accounts, keys, and weak
//! certificates.

pub mod client;

pub use client::{IntelClient, IntelConfig, IntelError};
