//! IoTVAS Assets: Qualys Asset Management client for tag sync.
//!
//! This crate is the single mutation point for the remote asset inventory.
//! All tag lookups, tag creation, and asset tag changes flow through
//! [`AssetClient`], which speaks the QPS REST 2.0 XML dialect.

pub mod client;
pub mod envelope;
pub mod mutations;
pub mod queries;
pub mod response;

pub use client::{AssetClient, AssetConfig, AssetError};
