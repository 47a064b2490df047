//! Per-run pipeline: nmap → features → IoTVAS → tag names → reconciliation.
//!
//! Hosts are processed one at a time and every remote call is awaited before
//! the next one starts. Per-host failures are logged and counted; only a
//! failed scan aborts the run.

use iotvas_core::{
    CryptoKey, DefaultAccount, DeviceFeatures, DeviceInfo, FirmwareIntel, FirmwareRisk, WeakCert,
};
use iotvas_intel::{IntelClient, IntelError};

use crate::error;
use crate::features::{extract_host_features, HostFeatures};
use crate::reconcile::{ReconcileReport, TagInventory, TagReconciler};
use crate::scanner::{NmapScanner, ScanRequest};
use crate::tags;

/// Lookups the pipeline needs from the device-intelligence service.
#[allow(async_fn_in_trait)]
pub trait DeviceIntelligence {
    async fn detect_device(&self, features: &DeviceFeatures) -> Result<DeviceInfo, IntelError>;
    async fn firmware_risk(&self, sha2: &str) -> Result<FirmwareRisk, IntelError>;
    async fn firmware_accounts(&self, sha2: &str) -> Result<Vec<DefaultAccount>, IntelError>;
    async fn firmware_private_keys(&self, sha2: &str) -> Result<Vec<CryptoKey>, IntelError>;
    async fn firmware_weak_keys(&self, sha2: &str) -> Result<Vec<CryptoKey>, IntelError>;
    async fn firmware_weak_certs(&self, sha2: &str) -> Result<Vec<WeakCert>, IntelError>;
}

impl DeviceIntelligence for IntelClient {
    async fn detect_device(&self, features: &DeviceFeatures) -> Result<DeviceInfo, IntelError> {
        IntelClient::detect_device(self, features).await
    }

    async fn firmware_risk(&self, sha2: &str) -> Result<FirmwareRisk, IntelError> {
        IntelClient::firmware_risk(self, sha2).await
    }

    async fn firmware_accounts(&self, sha2: &str) -> Result<Vec<DefaultAccount>, IntelError> {
        IntelClient::firmware_accounts(self, sha2).await
    }

    async fn firmware_private_keys(&self, sha2: &str) -> Result<Vec<CryptoKey>, IntelError> {
        IntelClient::firmware_private_keys(self, sha2).await
    }

    async fn firmware_weak_keys(&self, sha2: &str) -> Result<Vec<CryptoKey>, IntelError> {
        IntelClient::firmware_weak_keys(self, sha2).await
    }

    async fn firmware_weak_certs(&self, sha2: &str) -> Result<Vec<WeakCert>, IntelError> {
        IntelClient::firmware_weak_certs(self, sha2).await
    }
}

/// What happened to one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOutcome {
    /// Device identified and tags reconciled (possibly with per-tag failures).
    Enriched,
    /// Device identified but no host asset exists for the address.
    NoAsset,
    /// The service could not name the manufacturer and model.
    InsufficientData,
    /// Device detection call failed.
    DetectionFailed,
}

/// Totals for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub hosts_scanned: u32,
    pub hosts_enriched: u32,
    pub hosts_skipped: u32,
    pub tags: ReconcileReport,
}

/// Scan, then enrich and tag every fingerprinted host.
pub async fn run_single_scan<I, D>(
    scanner: &NmapScanner,
    intel: &D,
    reconciler: &mut TagReconciler<I>,
    request: &ScanRequest,
) -> error::Result<RunSummary>
where
    I: TagInventory,
    D: DeviceIntelligence,
{
    let scan_result = scanner.scan(request).await?;
    let hosts = extract_host_features(&scan_result.nmap_run);
    let summary = process_hosts(intel, reconciler, &hosts).await;

    tracing::info!(
        scan_id = %scan_result.scan_id,
        hosts = summary.hosts_scanned,
        enriched = summary.hosts_enriched,
        skipped = summary.hosts_skipped,
        tags_added = summary.tags.added,
        tags_removed = summary.tags.removed,
        tags_failed = summary.tags.failed,
        duration_ms = scan_result.duration.as_millis(),
        "Tag sync complete"
    );
    for (name, tag_id) in reconciler.unnested() {
        tracing::warn!(
            tag = %name,
            tag_id = %tag_id,
            parent_tag_id = %reconciler.parent_tag(),
            "Tag left outside the parent tag, re-parent it manually"
        );
    }

    Ok(summary)
}

/// Enrich and tag hosts sequentially.
pub async fn process_hosts<I, D>(
    intel: &D,
    reconciler: &mut TagReconciler<I>,
    hosts: &[HostFeatures],
) -> RunSummary
where
    I: TagInventory,
    D: DeviceIntelligence,
{
    let mut summary = RunSummary::default();

    for host in hosts {
        summary.hosts_scanned += 1;
        let (outcome, report) = process_host(intel, reconciler, host).await;
        summary.tags += report;
        match outcome {
            HostOutcome::Enriched => summary.hosts_enriched += 1,
            _ => summary.hosts_skipped += 1,
        }
    }

    summary
}

/// Identify one host and reconcile its device and firmware tag groups.
pub async fn process_host<I, D>(
    intel: &D,
    reconciler: &mut TagReconciler<I>,
    host: &HostFeatures,
) -> (HostOutcome, ReconcileReport)
where
    I: TagInventory,
    D: DeviceIntelligence,
{
    let address = host.address.as_str();
    let mut report = ReconcileReport::default();

    let info = match intel.detect_device(&host.features).await {
        Ok(info) => info,
        Err(e) => {
            tracing::error!(address = %address, error = %e, "Device detection failed");
            return (HostOutcome::DetectionFailed, report);
        }
    };

    let Some((vendor, model)) = info.identity() else {
        tracing::info!(address = %address, "Device maker and model not found");
        return (HostOutcome::InsufficientData, report);
    };
    tracing::info!(address = %address, vendor = %vendor, model = %model, "Device identified");

    report += reconciler
        .reconcile_tags(address, &tags::device_tag_names(&info))
        .await;
    if report.missing_assets > 0 {
        return (HostOutcome::NoAsset, report);
    }

    let Some((firmware, is_latest)) = info.assessed_firmware() else {
        tracing::debug!(address = %address, "No firmware information for device");
        return (HostOutcome::Enriched, report);
    };
    let Some(sha2) = iotvas_core::types::non_empty(&firmware.sha2) else {
        tracing::debug!(address = %address, "Firmware has no hash, skipping risk lookup");
        return (HostOutcome::Enriched, report);
    };

    let firmware_intel = fetch_firmware_intel(intel, sha2, is_latest).await;
    for group in tags::firmware_tag_groups(&firmware_intel) {
        report += reconciler.reconcile_tags(address, &group).await;
    }

    (HostOutcome::Enriched, report)
}

/// Fetch every firmware section; a failed section is logged and left empty.
pub async fn fetch_firmware_intel<D: DeviceIntelligence>(
    intel: &D,
    sha2: &str,
    is_latest: bool,
) -> FirmwareIntel {
    FirmwareIntel {
        sha2: sha2.to_string(),
        is_latest,
        risk: logged(intel.firmware_risk(sha2).await, sha2, "risk"),
        accounts: logged(intel.firmware_accounts(sha2).await, sha2, "default accounts"),
        private_keys: logged(intel.firmware_private_keys(sha2).await, sha2, "private keys"),
        weak_keys: logged(intel.firmware_weak_keys(sha2).await, sha2, "weak keys"),
        weak_certs: logged(intel.firmware_weak_certs(sha2).await, sha2, "weak certs"),
    }
}

fn logged<T>(result: Result<T, IntelError>, sha2: &str, section: &str) -> Option<T> {
    result
        .map_err(|e| {
            tracing::error!(sha2 = %sha2, section = %section, error = %e, "Failed to fetch firmware {section}");
        })
        .ok()
}
