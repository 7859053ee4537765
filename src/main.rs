//! column-areas CLI - tessellate column areas and sync them to target stores

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use column_areas::config::{RegionSelector, RunConfig, SiteSelector, SyncOptions};
use column_areas::io::GeoJsonFileSource;
use column_areas::sync::{AreaStore, JsonFileStore};

/// Run configuration file: the library selectors plus the input and store
/// file paths
#[derive(Debug, Deserialize)]
struct FileRunConfig {
    /// GeoJSON FeatureCollection of column sites (Point features)
    sites_file: PathBuf,
    /// GeoJSON boundary document (collection, feature, or bare geometry)
    region_file: PathBuf,
    /// One JSON store file per target store
    stores: Vec<PathBuf>,
    site_selector: SiteSelector,
    region_selector: RegionSelector,
    #[serde(default)]
    sync: SyncOptions,
}

#[derive(Parser)]
#[command(name = "column-areas")]
#[command(version, about = "Bounded Voronoi tessellation of column areas", long_about = None)]
struct Cli {
    /// Run configuration file (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("setting tracing subscriber")?;

    let text = fs::read_to_string(&cli.config)
        .with_context(|| format!("reading config {}", cli.config.display()))?;
    let file_config: FileRunConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", cli.config.display()))?;
    if file_config.stores.is_empty() {
        anyhow::bail!("no target stores configured");
    }

    let config = RunConfig::from_parts(
        file_config.site_selector,
        file_config.region_selector,
        file_config.sync,
    )?;

    let source = GeoJsonFileSource::new(&file_config.sites_file, &file_config.region_file);
    let mut stores: Vec<Box<dyn AreaStore>> = Vec::with_capacity(file_config.stores.len());
    for path in &file_config.stores {
        let store = JsonFileStore::open(path)
            .map_err(|err| anyhow::anyhow!("opening store {}: {}", path.display(), err))?;
        stores.push(Box::new(store));
    }

    let report = column_areas::run(&config, &source, &source, &stores)?;

    info!(
        inserted = report.inserted,
        updated = report.updated,
        failed = report.failures.len(),
        "run finished"
    );
    if !report.is_clean() {
        for failure in &report.failures {
            error!(
                site = failure.site,
                store = %failure.store,
                message = %failure.message,
                "failed write"
            );
        }
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
