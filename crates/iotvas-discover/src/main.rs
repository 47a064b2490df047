//! CLI entry point for iotvas-discover.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};

use iotvas_assets::{AssetClient, AssetConfig};
use iotvas_core::config::{self, DEFAULT_FILE_PREFIX};
use iotvas_intel::{IntelClient, IntelConfig};

use iotvas_discover::config::DiscoverConfig;
use iotvas_discover::logging;
use iotvas_discover::pipeline::run_single_scan;
use iotvas_discover::reconcile::TagReconciler;
use iotvas_discover::scanner::{NmapScanner, ScanRequest};

#[derive(Parser)]
#[command(name = "iotvas-discover")]
#[command(about = "Discover IoT devices with nmap and tag their Qualys assets using IoTVAS")]
struct Cli {
    /// File with one nmap target (address, range or CIDR) per line.
    #[arg(short = 't', long)]
    targets_file: PathBuf,

    /// Nmap exclude file with targets to skip.
    #[arg(short = 'e', long)]
    exclude_targets: Option<PathBuf>,

    /// Config file prefix (default: iotvas).
    #[arg(short, long, default_value = DEFAULT_FILE_PREFIX)]
    config: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    if std::env::args_os().len() == 1 {
        eprintln!("{}", Cli::command().render_help());
        std::process::exit(1);
    }
    let cli = Cli::parse();

    let cfg = config::load_layered(&cli.config)?;
    let discover_config: DiscoverConfig = config::section(&cfg, "discover")?;
    let intel_config: IntelConfig = config::section(&cfg, "intel")?;
    let asset_config: AssetConfig = config::section(&cfg, "assets")?;

    let log_file = logging::init(Path::new(&discover_config.log_dir))?;
    tracing::info!(log_file = %log_file.display(), "Logging initialized");

    config::require("intel.api_key", &intel_config.api_key)?;
    config::require("assets.username", &asset_config.username)?;
    config::require("assets.password", &asset_config.password)?;

    let request = ScanRequest::from_files(&cli.targets_file, cli.exclude_targets.as_deref())?;

    let intel = IntelClient::new(&intel_config)?;
    let assets = AssetClient::new(&asset_config)?;
    tracing::info!(qualys = %assets.base_url(), "Qualys asset client ready");

    let mut reconciler = TagReconciler::start(assets, &asset_config.parent_tag_name).await?;

    let scanner = NmapScanner::new(&discover_config);
    match scanner.verify_installation().await {
        Ok(version) => {
            tracing::info!(nmap_version = %version.lines().next().unwrap_or("").trim(), "Nmap verified");
        }
        Err(e) => {
            tracing::error!(error = %e, "Nmap is not available");
            return Ok(());
        }
    }

    if let Err(e) = run_single_scan(&scanner, &intel, &mut reconciler, &request).await {
        tracing::error!(error = %e, "Scan failed");
    }

    Ok(())
}
