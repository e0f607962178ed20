use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::analytics::{AssetAnalysis, AssetPipeline, MetricsAssembler};
use crate::artifact::ProcessedArtifact;
use crate::config::AnalyticsConfig;
use crate::data::{self, SnapshotOverrides};
use crate::error::GexError;
use crate::model::{AssetMetrics, MetricsBook};
use crate::render;

/// Configuration for an `analyze` run.
pub struct AnalyzeConfig {
    pub files: Vec<PathBuf>,
    pub last_prices: Vec<String>,
    pub assets: Vec<String>,
    pub as_of: Option<NaiveDate>,
    pub zero_dte: bool,
    pub flip_point: bool,
    pub window: Option<usize>,
    pub config_path: Option<PathBuf>,
    pub processed_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub pine: bool,
    pub verbose: bool,
}

/// Configuration for recomputing metrics from processed artifacts.
pub struct ArtifactConfig {
    pub files: Vec<PathBuf>,
    pub window: Option<usize>,
    pub config_path: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub pine: bool,
}

pub fn load_config(path: Option<&Path>) -> Result<AnalyticsConfig> {
    match path {
        Some(path) => AnalyticsConfig::load(path)
            .with_context(|| format!("loading analytics config {}", path.display())),
        None => Ok(AnalyticsConfig::default()),
    }
}

/// Per-file value from a repeated flag: either one value per file or none.
fn per_file<'a>(values: &'a [String], files: usize, flag: &str) -> Result<Vec<Option<&'a str>>> {
    match values.len() {
        0 => Ok(vec![None; files]),
        n if n == files => Ok(values.iter().map(|v| Some(v.as_str())).collect()),
        n => bail!("{flag} given {n} time(s) for {files} input file(s); pass it once per file"),
    }
}

/// Run the `analyze` command: ingest each export, compute metrics per
/// asset, persist artifacts and print the results.
pub fn run(config: &AnalyzeConfig) -> Result<()> {
    if config.files.is_empty() {
        bail!("No input files given");
    }
    let analytics = load_config(config.config_path.as_deref())?;
    let last_prices = per_file(&config.last_prices, config.files.len(), "--last-price")?;
    let assets = per_file(&config.assets, config.files.len(), "--asset")?;

    let mut failures: Vec<(String, GexError)> = Vec::new();
    let mut snapshots = Vec::new();
    for ((path, last_price), asset) in config.files.iter().zip(last_prices).zip(assets) {
        let overrides = SnapshotOverrides {
            asset_id: asset.map(str::to_string),
            last_price: last_price.map(str::to_string),
            as_of: config.as_of,
        };
        match data::load_cboe_snapshot(path, &overrides) {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => {
                let asset = overrides
                    .asset_id
                    .unwrap_or_else(|| data::asset_id_from_path(path));
                warn!(asset = %asset, file = %path.display(), error = %e, "could not load option chain");
                failures.push((asset, e));
            }
        }
    }

    let mut pipeline = AssetPipeline::new(&analytics);
    pipeline.zero_dte = config.zero_dte;
    pipeline.flip_point = config.flip_point;
    if let Some(window) = config.window {
        pipeline.window = window;
    }

    let outcome = pipeline.analyze_all(&snapshots);
    failures.extend(outcome.failures);

    for analysis in &outcome.analyses {
        if let Some(dir) = &config.processed_dir {
            if let Err(e) = persist(dir, analysis) {
                let asset = analysis.metrics.asset_id.clone();
                warn!(asset = %asset, dir = %dir.display(), error = %e, "could not write artifact");
                failures.push((asset, e));
            }
        }
        report(&analysis.metrics, pipeline.window, config.pine);
        if config.verbose {
            if let Some(profile) = &analysis.profile {
                render::print_profile(&analysis.metrics.asset_id, profile);
            }
        }
    }

    finish(&outcome.book, failures, config.output.as_deref())
}

/// Run the `from-artifact` command: metrics from processed artifacts, no
/// flip point.
pub fn run_from_artifacts(config: &ArtifactConfig) -> Result<()> {
    if config.files.is_empty() {
        bail!("No artifact files given");
    }
    let analytics = load_config(config.config_path.as_deref())?;
    let mut pipeline = AssetPipeline::new(&analytics);
    if let Some(window) = config.window {
        pipeline.window = window;
    }

    let mut failures = Vec::new();
    let mut records = Vec::new();
    for path in &config.files {
        let asset = data::asset_id_from_path(path);
        let result = ProcessedArtifact::read(path)
            .and_then(|artifact| artifact.into_chain(analytics.strike_scale))
            .and_then(|chain| pipeline.metrics_from_chain(&asset, &chain));
        match result {
            Ok(metrics) => {
                report(&metrics, pipeline.window, config.pine);
                records.push(metrics);
            }
            Err(e) => {
                warn!(asset = %asset, file = %path.display(), error = %e, "could not read artifact");
                failures.push((asset, e));
            }
        }
    }

    let book = MetricsAssembler::merge(records);
    finish(&book, failures, config.output.as_deref())
}

fn persist(dir: &Path, analysis: &AssetAnalysis) -> crate::error::Result<PathBuf> {
    ProcessedArtifact::from_chain(&analysis.chain).write(dir, &analysis.metrics.asset_id)
}

fn report(metrics: &AssetMetrics, window: usize, pine: bool) {
    render::print_summary(metrics, window);
    if pine {
        println!(
            "\n>>> Pine Script for {}:\n\n{}",
            metrics.asset_id.to_uppercase(),
            render::pine_script(metrics)
        );
    }
}

fn finish(book: &MetricsBook, failures: Vec<(String, GexError)>, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        let json = serde_json::to_string_pretty(book)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), assets = book.len(), "wrote metrics");
    }

    if !failures.is_empty() {
        eprintln!("{} asset(s) failed:", failures.len());
        for (i, (asset, e)) in failures.iter().enumerate() {
            eprintln!("  {}. {}: {}", i + 1, asset, e);
        }
        if book.is_empty() {
            bail!("No asset produced metrics");
        }
    }
    Ok(())
}
