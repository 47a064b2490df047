//! HTTP client for the IoTVAS REST API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use iotvas_core::{CryptoKey, DefaultAccount, DeviceFeatures, DeviceInfo, FirmwareRisk, WeakCert};

const API_KEY_HEADER: &str = "x-api-key";

/// Errors from device-intelligence operations.
#[derive(Debug, thiserror::Error)]
pub enum IntelError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IoTVAS API returned HTTP {status} for {path}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode IoTVAS response for {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("API key is not a valid header value")]
    InvalidApiKey,
}

/// Configuration for the IoTVAS API.
///
/// Loaded from the `[intel]` section or `IOTVAS_INTEL__` environment
/// variables.
#[derive(Debug, Clone, Deserialize)]
pub struct IntelConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Request timeout; the transport default applies when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "https://iotvas-api.firmalyzer.com/api/v1".to_string()
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            timeout_secs: None,
        }
    }
}

/// Client for device detection and firmware risk lookups.
#[derive(Debug, Clone)]
pub struct IntelClient {
    http: reqwest::Client,
    base_url: String,
}

impl IntelClient {
    pub fn new(config: &IntelConfig) -> Result<Self, IntelError> {
        let mut key = HeaderValue::from_str(&config.api_key).map_err(|_| IntelError::InvalidApiKey)?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Identify a device from its scan fingerprint.
    pub async fn detect_device(&self, features: &DeviceFeatures) -> Result<DeviceInfo, IntelError> {
        let path = "/device/detect";
        let resp = self
            .http
            .post(self.endpoint(path))
            .json(features)
            .send()
            .await?;
        decode(path, resp).await
    }

    pub async fn firmware_risk(&self, sha2: &str) -> Result<FirmwareRisk, IntelError> {
        self.get_json(&firmware_path(sha2, "risk")).await
    }

    pub async fn firmware_accounts(&self, sha2: &str) -> Result<Vec<DefaultAccount>, IntelError> {
        self.get_json(&firmware_path(sha2, "accounts")).await
    }

    pub async fn firmware_private_keys(&self, sha2: &str) -> Result<Vec<CryptoKey>, IntelError> {
        self.get_json(&firmware_path(sha2, "private-keys")).await
    }

    pub async fn firmware_weak_keys(&self, sha2: &str) -> Result<Vec<CryptoKey>, IntelError> {
        self.get_json(&firmware_path(sha2, "weak-keys")).await
    }

    pub async fn firmware_weak_certs(&self, sha2: &str) -> Result<Vec<WeakCert>, IntelError> {
        self.get_json(&firmware_path(sha2, "weak-certs")).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, IntelError> {
        let resp = self.http.get(self.endpoint(path)).send().await?;
        decode(path, resp).await
    }
}

fn firmware_path(sha2: &str, section: &str) -> String {
    format!("/firmware/{sha2}/{section}")
}

async fn decode<T: DeserializeOwned>(path: &str, resp: reqwest::Response) -> Result<T, IntelError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(IntelError::Status {
            path: path.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    tracing::debug!(path = %path, bytes = body.len(), "IoTVAS response");
    decode_body(path, &body)
}

fn decode_body<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, IntelError> {
    serde_json::from_str(body).map_err(|source| IntelError::Decode {
        path: path.to_string(),
        source,
    })
}
