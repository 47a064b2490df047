//! HTTP session management and shared asset inventory client.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;

/// Errors from asset inventory operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Asset API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Asset API rejected {operation}: {code}: {message}")]
    Api {
        operation: &'static str,
        code: String,
        message: String,
    },

    #[error("Failed to parse asset API response: {0}")]
    Parse(String),

    #[error("Asset API response for {operation} is missing {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
}

/// Configuration for the Qualys Asset Management API.
///
/// Loaded from the `[assets]` section or `IOTVAS_ASSETS__` environment
/// variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    /// API server base, e.g. `https://qualysapi.qualys.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Container tag under which every created tag is nested.
    #[serde(default = "default_parent_tag_name")]
    pub parent_tag_name: String,

    /// Request timeout; the transport default applies when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "https://qualysapi.qualys.com".to_string()
}

fn default_parent_tag_name() -> String {
    "IoTVAS".to_string()
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: String::new(),
            password: String::new(),
            parent_tag_name: default_parent_tag_name(),
            timeout_secs: None,
        }
    }
}

/// Authenticated client for the QPS REST 2.0 asset endpoints.
///
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct AssetClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl AssetClient {
    /// Build a client with basic-auth credentials from the configuration.
    pub fn new(config: &AssetConfig) -> Result<Self, AssetError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a QPS path such as `/qps/rest/2.0/search/am/tag`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST an XML service request and return the raw response body.
    pub async fn post(&self, path: &str, body: String) -> Result<String, AssetError> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "Asset API request");

        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "text/xml")
            .header(ACCEPT, "application/xml")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(AssetError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssetConfig::default();
        assert_eq!(config.base_url, "https://qualysapi.qualys.com");
        assert_eq!(config.parent_tag_name, "IoTVAS");
        assert!(config.timeout_secs.is_none());
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = AssetConfig {
            base_url: "https://qualysapi.qg2.apps.qualys.eu/".to_string(),
            ..Default::default()
        };
        let client = AssetClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("/qps/rest/2.0/search/am/tag"),
            "https://qualysapi.qg2.apps.qualys.eu/qps/rest/2.0/search/am/tag"
        );
    }
}
