//! Tag name generation from device and firmware intelligence.
//!
//! Every function here is a pure mapping from facts to an ordered list of
//! tag names, so an unchanged device yields the same tags on every run and
//! reconciliation stays a no-op. Names follow the `"<Category>: <Value>"`
//! convention; the category groups mutually exclusive values on an asset.
//!
//! Firmware tags carry an `L` prefix (`LFW_...`) when the facts describe the
//! latest published firmware rather than the firmware actually installed.

use chrono::NaiveDate;

use iotvas_core::types::non_empty;
use iotvas_core::{
    CryptoKey, DefaultAccount, DeviceInfo, FirmwareInfo, FirmwareIntel, FirmwareRisk, WeakCert,
};

const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Tags describing the device itself.
pub fn device_tag_names(info: &DeviceInfo) -> Vec<String> {
    let mut tags = Vec::new();

    if let Some(vendor) = non_empty(&info.manufacturer) {
        tags.push(format!("Vendor: {vendor}"));
    }
    if let Some(model) = non_empty(&info.model_name) {
        tags.push(format!("Model: {model}"));
    }
    if let Some(version) = non_empty(&info.firmware_version) {
        tags.push(format!("FW_Version: {version}"));
    }
    if let Some(version) = info
        .latest_firmware_info
        .as_ref()
        .and_then(|fw| non_empty(&fw.version))
    {
        tags.push(format!("LFW_Version: {version}"));
    }
    if info.is_discontinued == Some(true) {
        tags.push("Discontinued".to_string());
    }
    if let Some(device_type) = non_empty(&info.device_type) {
        tags.push(format!("Type: {device_type}"));
    }
    if let (Some(installed), Some(latest)) = (&info.firmware_info, &info.latest_firmware_info) {
        if is_outdated(installed, latest) {
            tags.push("Outdated_FW".to_string());
        }
    }
    tags.extend(info.cve_list.iter().map(|cve| cve.cve_id.clone()));

    tags
}

/// Installed firmware was released before the latest one. Unknown or
/// unparsable dates never count as outdated.
fn is_outdated(installed: &FirmwareInfo, latest: &FirmwareInfo) -> bool {
    let (Some(installed_date), Some(latest_date)) =
        (non_empty(&installed.release_date), non_empty(&latest.release_date))
    else {
        return false;
    };

    match (
        NaiveDate::parse_from_str(installed_date, RELEASE_DATE_FORMAT),
        NaiveDate::parse_from_str(latest_date, RELEASE_DATE_FORMAT),
    ) {
        (Ok(installed), Ok(latest)) => installed < latest,
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(
                installed = %installed_date,
                latest = %latest_date,
                error = %e,
                "Unparsable firmware release date"
            );
            false
        }
    }
}

fn prefix(base: &str, is_latest: bool) -> String {
    if is_latest {
        format!("L{base}")
    } else {
        base.to_string()
    }
}

/// Risk summary levels and vulnerable component CVEs.
pub fn firmware_tag_names(risk: &FirmwareRisk, is_latest: bool) -> Vec<String> {
    let summary_prefix = prefix("FW_", is_latest);
    let mut tags: Vec<String> = risk
        .risk_summary
        .entries()
        .into_iter()
        .filter_map(|(key, level)| match level {
            Some(level) if level != "None" => Some(format!("{summary_prefix}{key}: {level}")),
            _ => None,
        })
        .collect();

    let cve_prefix = prefix("FW", is_latest);
    for component in &risk.vulnerable_components {
        for vuln in &component.vulnerabilities {
            tags.push(format!("{cve_prefix}: {}", vuln.cve_id));
        }
    }

    tags
}

/// Default accounts that have a password set.
pub fn account_tag_names(accounts: &[DefaultAccount], is_latest: bool) -> Vec<String> {
    let p = prefix("FW_Acct", is_latest);
    accounts
        .iter()
        .filter(|a| a.has_password())
        .map(|a| format!("{p}: {}", a.name))
        .collect()
}

/// Embedded private keys, as `algorithm/bits`.
pub fn private_key_tag_names(keys: &[CryptoKey], is_latest: bool) -> Vec<String> {
    key_tag_names(&prefix("FW_Pkey", is_latest), keys)
}

/// Weak keys, as `algorithm/bits`.
pub fn weak_key_tag_names(keys: &[CryptoKey], is_latest: bool) -> Vec<String> {
    key_tag_names(&prefix("FW_WKey", is_latest), keys)
}

fn key_tag_names(category: &str, keys: &[CryptoKey]) -> Vec<String> {
    keys.iter()
        .filter_map(|key| {
            let algorithm = non_empty(&key.algorithm)?;
            let bits = key.bits.filter(|b| *b > 0)?;
            Some(format!("{category}: {algorithm}/{bits}"))
        })
        .collect()
}

/// Signature algorithms of weak certificates.
pub fn weak_cert_tag_names(certs: &[WeakCert], is_latest: bool) -> Vec<String> {
    let p = prefix("FW_WCert", is_latest);
    certs
        .iter()
        .filter_map(|c| non_empty(&c.sign_algorithm))
        .map(|alg| format!("{p}: {alg}"))
        .collect()
}

/// Firmware tag groups in reconciliation order: risk, accounts, private
/// keys, weak keys, weak certificates. Sections that failed to fetch yield
/// no group.
pub fn firmware_tag_groups(intel: &FirmwareIntel) -> Vec<Vec<String>> {
    let latest = intel.is_latest;
    let mut groups = Vec::new();

    if let Some(risk) = &intel.risk {
        groups.push(firmware_tag_names(risk, latest));
    }
    if let Some(accounts) = &intel.accounts {
        groups.push(account_tag_names(accounts, latest));
    }
    if let Some(keys) = &intel.private_keys {
        groups.push(private_key_tag_names(keys, latest));
    }
    if let Some(keys) = &intel.weak_keys {
        groups.push(weak_key_tag_names(keys, latest));
    }
    if let Some(certs) = &intel.weak_certs {
        groups.push(weak_cert_tag_names(certs, latest));
    }

    groups
}
