//! Nmap process wrapper.
//!
//! Executes nmap as a child process via `tokio::process::Command` and
//! parses the XML output into typed Rust structs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::process::Command;
use uuid::Uuid;

use crate::config::DiscoverConfig;
use crate::error::{DiscoverError, Result};
use crate::nmap_xml::{self, NmapRun};

/// What to scan: the target list and an optional nmap exclude file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub targets: Vec<String>,
    pub exclude_file: Option<PathBuf>,
}

impl ScanRequest {
    /// Read targets (one per line, blank lines ignored) from `targets_file`.
    pub fn from_files(targets_file: &Path, exclude_file: Option<&Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(targets_file)?;
        let targets: Vec<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        if targets.is_empty() {
            return Err(DiscoverError::NoTargets {
                path: targets_file.to_path_buf(),
            });
        }

        Ok(Self {
            targets,
            exclude_file: exclude_file.map(Path::to_path_buf),
        })
    }
}

/// Result of a single nmap scan execution.
pub struct ScanResult {
    /// Unique ID for this scan run.
    pub scan_id: Uuid,
    /// Parsed nmap XML output.
    pub nmap_run: NmapRun,
    /// Wall-clock duration of the scan.
    pub duration: std::time::Duration,
}

/// Wrapper around the nmap binary.
pub struct NmapScanner {
    nmap_path: String,
    flags: Vec<String>,
}

impl NmapScanner {
    pub fn new(config: &DiscoverConfig) -> Self {
        Self {
            nmap_path: config.nmap_path.clone(),
            flags: config.nmap_flags(),
        }
    }

    /// Verify nmap is installed and accessible.
    pub async fn verify_installation(&self) -> Result<String> {
        let output = Command::new(&self.nmap_path)
            .arg("--version")
            .output()
            .await
            .map_err(|_| DiscoverError::NmapNotFound {
                path: self.nmap_path.clone(),
            })?;

        String::from_utf8(output.stdout).map_err(|e| DiscoverError::XmlParse(e.to_string()))
    }

    /// Full argument list for a scan: profile flags, exclusions, XML to
    /// stdout, then the targets.
    pub fn command_args(&self, request: &ScanRequest) -> Vec<String> {
        let mut args = self.flags.clone();
        if let Some(exclude) = &request.exclude_file {
            args.push("--excludefile".to_string());
            args.push(exclude.display().to_string());
        }
        args.extend(["-oX", "-", "--noninteractive"].map(String::from));
        args.extend(request.targets.iter().cloned());
        args
    }

    /// Execute the fingerprinting scan.
    ///
    /// Nmap is invoked with `-oX -` to write XML to stdout. The process runs
    /// under `tokio::process::Command` so it does not block the async runtime.
    pub async fn scan(&self, request: &ScanRequest) -> Result<ScanResult> {
        let scan_id = Uuid::new_v4();
        let start = Instant::now();
        let args = self.command_args(request);

        tracing::info!(
            scan_id = %scan_id,
            targets = request.targets.len(),
            command = %format!("{} {}", self.nmap_path, args.join(" ")),
            "Starting nmap scan"
        );

        let output = Command::new(&self.nmap_path)
            .args(&args)
            .output()
            .await
            .map_err(|e| DiscoverError::NmapNotFound {
                path: format!("{}: {e}", self.nmap_path),
            })?;

        let duration = start.elapsed();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(DiscoverError::NmapFailed {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        let nmap_run = nmap_xml::parse_nmap_xml(&output.stdout)?;
        let host_count = nmap_run.hosts.iter().filter(|h| h.is_up()).count();

        tracing::info!(
            scan_id = %scan_id,
            hosts_up = host_count,
            duration_ms = duration.as_millis(),
            "Nmap scan complete"
        );

        Ok(ScanResult {
            scan_id,
            nmap_run,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_targets_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.txt");
        std::fs::write(&path, "10.0.0.1\n\n  10.0.1.0/24  \r\n192.168.1.1-20\n").unwrap();

        let request = ScanRequest::from_files(&path, None).unwrap();
        assert_eq!(
            request.targets,
            vec!["10.0.0.1", "10.0.1.0/24", "192.168.1.1-20"]
        );
        assert!(request.exclude_file.is_none());
    }

    #[test]
    fn test_empty_targets_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.txt");
        std::fs::write(&path, "\n   \n").unwrap();

        assert!(matches!(
            ScanRequest::from_files(&path, None),
            Err(DiscoverError::NoTargets { .. })
        ));
    }

    #[test]
    fn test_missing_targets_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ScanRequest::from_files(&dir.path().join("nope.txt"), None),
            Err(DiscoverError::Io(_))
        ));
    }

    #[test]
    fn test_command_args() {
        let scanner = NmapScanner::new(&DiscoverConfig::default());
        let request = ScanRequest {
            targets: vec!["10.0.0.1".to_string(), "10.0.2.0/24".to_string()],
            exclude_file: Some(PathBuf::from("/etc/iotvas/exclude.txt")),
        };

        assert_eq!(
            scanner.command_args(&request),
            vec![
                "-sSU",
                "-p",
                "U:161,T:-",
                "--top-ports",
                "1000",
                "--script",
                "iotvas-features.nse",
                "--excludefile",
                "/etc/iotvas/exclude.txt",
                "-oX",
                "-",
                "--noninteractive",
                "10.0.0.1",
                "10.0.2.0/24",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_nmap_binary() {
        let config = DiscoverConfig {
            nmap_path: "/nonexistent/nmap".to_string(),
            ..Default::default()
        };
        let scanner = NmapScanner::new(&config);
        assert!(matches!(
            scanner.verify_installation().await,
            Err(DiscoverError::NmapNotFound { .. })
        ));
    }
}
