//! Configuration for the iotvas-discover scanner.

use serde::Deserialize;

/// Top-level discover configuration.
///
/// Loaded from `iotvas.toml` `[discover]` section or
/// `IOTVAS_DISCOVER__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverConfig {
    /// Path to the nmap binary (default: "nmap").
    #[serde(default = "default_nmap_path")]
    pub nmap_path: String,

    /// NSE script that emits the `iotvas-features` host script table.
    #[serde(default = "default_script")]
    pub script: String,

    /// Port specification passed to `-p`.
    #[serde(default = "default_ports")]
    pub ports: String,

    /// Number of most common ports passed to `--top-ports`.
    #[serde(default = "default_top_ports")]
    pub top_ports: u32,

    /// Directory for the daily log files.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl DiscoverConfig {
    /// Nmap flags for a fingerprinting scan: TCP SYN plus UDP (for SNMP),
    /// with the features script. Output and target arguments are added by the
    /// scanner.
    pub fn nmap_flags(&self) -> Vec<String> {
        vec![
            "-sSU".to_string(),
            "-p".to_string(),
            self.ports.clone(),
            "--top-ports".to_string(),
            self.top_ports.to_string(),
            "--script".to_string(),
            self.script.clone(),
        ]
    }
}

fn default_nmap_path() -> String {
    "nmap".to_string()
}

fn default_script() -> String {
    "iotvas-features.nse".to_string()
}

fn default_ports() -> String {
    "U:161,T:-".to_string()
}

fn default_top_ports() -> u32 {
    1000
}

fn default_log_dir() -> String {
    "./logs".to_string()
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            nmap_path: default_nmap_path(),
            script: default_script(),
            ports: default_ports(),
            top_ports: default_top_ports(),
            log_dir: default_log_dir(),
        }
    }
}
