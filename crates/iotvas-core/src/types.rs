//! Core domain types for the IoTVAS asset tag sync.
//!
//! Two families live here: the inventory side (tags and host assets as the
//! asset-tagging system reports them) and the intelligence side (device,
//! firmware, and risk facts as the device-intelligence API reports them).
//! Intelligence types deserialize straight from the API's JSON, so every
//! field the API may send as `null` is optional.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ── Tags ──────────────────────────────────────────────────────────

/// Identifier assigned to a tag by the asset inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TagId(pub String);

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a host asset in the inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AssetId(pub String);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named tag known to the inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// Category of a tag name: everything before the first colon, or the whole
/// name for bare labels such as `Discontinued`.
pub fn tag_category(name: &str) -> &str {
    name.split_once(':').map_or(name, |(category, _)| category)
}

/// A pre-existing host asset and the tags currently attached to it.
///
/// Tags keep the order the inventory returned them in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostAsset {
    pub id: AssetId,
    pub address: Option<String>,
    pub tags: Vec<Tag>,
}

impl HostAsset {
    /// Whether a tag with exactly this name is attached.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }

    /// First attached tag in the same category as `name`.
    pub fn same_category_tag(&self, name: &str) -> Option<&Tag> {
        let category = tag_category(name);
        self.tags.iter().find(|t| tag_category(&t.name) == category)
    }
}

// ── Device features ───────────────────────────────────────────────

/// Fingerprint features collected for one host by the nmap script.
///
/// Serialized as-is into the device detection request body; features the
/// scan did not produce are sent as empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceFeatures {
    pub snmp_sysdescr: String,
    pub snmp_sysoid: String,
    pub ftp_banner: String,
    pub telnet_banner: String,
    pub hostname: String,
    pub http_response: String,
    pub https_response: String,
    pub upnp_response: String,
    pub nic_mac: String,
}

impl DeviceFeatures {
    /// Keys recognised in the scan output.
    pub const KEYS: [&'static str; 9] = [
        "snmp_sysdescr",
        "snmp_sysoid",
        "ftp_banner",
        "telnet_banner",
        "hostname",
        "http_response",
        "https_response",
        "upnp_response",
        "nic_mac",
    ];

    /// Set a feature by its scan-output key. Returns false for unknown keys.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let slot = match key {
            "snmp_sysdescr" => &mut self.snmp_sysdescr,
            "snmp_sysoid" => &mut self.snmp_sysoid,
            "ftp_banner" => &mut self.ftp_banner,
            "telnet_banner" => &mut self.telnet_banner,
            "hostname" => &mut self.hostname,
            "http_response" => &mut self.http_response,
            "https_response" => &mut self.https_response,
            "upnp_response" => &mut self.upnp_response,
            "nic_mac" => &mut self.nic_mac,
            _ => return false,
        };
        *slot = value.to_string();
        true
    }

    /// True when the scan produced nothing to fingerprint on.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ── Device intelligence ───────────────────────────────────────────

/// Device identity returned by device detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceInfo {
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub firmware_version: Option<String>,
    pub is_discontinued: Option<bool>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cve_list: Vec<Vulnerability>,
    pub device_type: Option<String>,
    pub firmware_info: Option<FirmwareInfo>,
    pub latest_firmware_info: Option<FirmwareInfo>,
}

impl DeviceInfo {
    /// Manufacturer and model, when both are known.
    pub fn identity(&self) -> Option<(&str, &str)> {
        Some((
            non_empty(&self.manufacturer)?,
            non_empty(&self.model_name)?,
        ))
    }

    /// Firmware to assess for risk: the installed one when identified,
    /// otherwise the latest known release. The flag is true for the latter.
    pub fn assessed_firmware(&self) -> Option<(&FirmwareInfo, bool)> {
        match (&self.firmware_info, &self.latest_firmware_info) {
            (Some(installed), _) => Some((installed, false)),
            (None, Some(latest)) => Some((latest, true)),
            (None, None) => None,
        }
    }
}

/// A firmware release known to the intelligence service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirmwareInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub sha2: Option<String>,
    pub release_date: Option<String>,
    pub download_url: Option<String>,
}

/// A CVE reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vulnerability {
    pub cve_id: String,
    pub cvss: Option<f64>,
}

/// Firmware-level risk assessment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FirmwareRisk {
    #[serde(default)]
    pub risk_summary: RiskSummary,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub vulnerable_components: Vec<VulnerableComponent>,
}

/// Per-area risk levels ("Critical", "High", ..., "None").
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskSummary {
    pub net_services_risk: Option<String>,
    pub crypto_risk: Option<String>,
    pub kernel_risk: Option<String>,
    pub client_tools_risk: Option<String>,
}

impl RiskSummary {
    /// Risk entries in the order the service reports them.
    pub fn entries(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("net_services_risk", self.net_services_risk.as_deref()),
            ("crypto_risk", self.crypto_risk.as_deref()),
            ("kernel_risk", self.kernel_risk.as_deref()),
            ("client_tools_risk", self.client_tools_risk.as_deref()),
        ]
    }
}

/// A vulnerable third-party component bundled in the firmware.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VulnerableComponent {
    pub name: Option<String>,
    pub version: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub vulnerabilities: Vec<Vulnerability>,
    pub cvss_max: Option<f64>,
}

/// A default OS account found in the firmware image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefaultAccount {
    pub name: String,
    pub pwd_hash: Option<String>,
    pub hash_algorithm: Option<String>,
    pub shell: Option<String>,
    pub uid: Option<i64>,
    pub gid: Option<i64>,
    pub home_dir: Option<String>,
}

impl DefaultAccount {
    /// Accounts with a usable password hash (not empty, not locked with `*`).
    pub fn has_password(&self) -> bool {
        matches!(self.pwd_hash.as_deref(), Some(h) if !h.is_empty() && h != "*")
    }
}

/// A private or weak crypto key embedded in the firmware image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CryptoKey {
    pub file_name: Option<String>,
    pub file_hash: Option<String>,
    pub pem_type: Option<String>,
    pub algorithm: Option<String>,
    pub bits: Option<u32>,
}

/// A certificate signed with a weak algorithm.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeakCert {
    pub file_name: Option<String>,
    pub file_hash: Option<String>,
    pub thumb_print: Option<String>,
    pub sign_algorithm: Option<String>,
    pub subject_name: Option<String>,
    pub valid_from: Option<String>,
    pub valid_to: Option<String>,
}

/// Everything fetched about one firmware image.
///
/// A section is `None` when fetching it failed; the remaining sections are
/// still usable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FirmwareIntel {
    pub sha2: String,
    pub is_latest: bool,
    pub risk: Option<FirmwareRisk>,
    pub accounts: Option<Vec<DefaultAccount>>,
    pub private_keys: Option<Vec<CryptoKey>>,
    pub weak_keys: Option<Vec<CryptoKey>>,
    pub weak_certs: Option<Vec<WeakCert>>,
}

/// Treat `None` and empty strings alike.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
