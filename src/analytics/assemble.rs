use rayon::prelude::*;
use tracing::{info, warn};

use super::aggregate::{AggregatedChain, StrikeGexAggregator};
use super::flip::GammaFlipSolver;
use super::levels::{WallLevelExtractor, WallLevels};
use crate::config::AnalyticsConfig;
use crate::error::{GexError, Result};
use crate::model::{AssetMetrics, GammaProfile, MetricsBook, OptionChainSnapshot};

/// Composes aggregation, flip and wall outputs into one record. Pure
/// structure, no arithmetic of its own.
pub struct MetricsAssembler;

impl MetricsAssembler {
    pub fn assemble(
        asset_id: &str,
        chain: &AggregatedChain,
        profile: Option<&GammaProfile>,
        walls: WallLevels,
    ) -> AssetMetrics {
        AssetMetrics {
            asset_id: asset_id.to_string(),
            last_price: chain.last_price,
            strikes: chain.strikes.clone(),
            call_wall_strike: walls.call_wall,
            put_wall_strike: walls.put_wall,
            flip_price: profile.and_then(|p| p.flip.price()),
            top_calls: walls.top_calls,
            top_puts: walls.top_puts,
        }
    }

    /// Merge per-asset records into one hand-off mapping keyed by asset.
    pub fn merge(records: impl IntoIterator<Item = AssetMetrics>) -> MetricsBook {
        records.into_iter().collect()
    }
}

/// Everything derived for one asset, including the intermediates the
/// binary persists or prints.
#[derive(Debug, Clone)]
pub struct AssetAnalysis {
    pub chain: AggregatedChain,
    pub profile: Option<GammaProfile>,
    pub metrics: AssetMetrics,
}

/// Result of a multi-asset run: merged metrics plus per-asset failures.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub analyses: Vec<AssetAnalysis>,
    pub book: MetricsBook,
    pub failures: Vec<(String, GexError)>,
}

/// Per-asset pipeline: aggregate, optionally solve the flip, extract walls,
/// assemble. Stateless, so one instance serves any number of assets.
pub struct AssetPipeline<'a> {
    pub config: &'a AnalyticsConfig,
    pub zero_dte: bool,
    pub flip_point: bool,
    pub window: usize,
}

impl<'a> AssetPipeline<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self {
            config,
            zero_dte: false,
            flip_point: false,
            window: config.focus_window,
        }
    }

    pub fn analyze(&self, snapshot: &OptionChainSnapshot) -> Result<AssetAnalysis> {
        let chain = StrikeGexAggregator::new(self.config).aggregate(snapshot, self.zero_dte)?;
        let profile = self
            .flip_point
            .then(|| GammaFlipSolver::new(self.config).solve(snapshot, self.zero_dte));
        let walls = WallLevelExtractor::new(self.config).extract(
            &chain.strikes,
            chain.last_price,
            self.window,
        )?;
        let metrics = MetricsAssembler::assemble(&snapshot.asset_id, &chain, profile.as_ref(), walls);

        info!(
            asset = %snapshot.asset_id,
            strikes = chain.strikes.len(),
            call_wall = %metrics.call_wall_strike,
            put_wall = %metrics.put_wall_strike,
            flip = ?metrics.flip_price,
            "computed GEX metrics"
        );

        Ok(AssetAnalysis {
            chain,
            profile,
            metrics,
        })
    }

    /// Metrics for a chain that was aggregated earlier, e.g. read back from
    /// a processed artifact. No flip: the artifact carries no volatilities.
    pub fn metrics_from_chain(&self, asset_id: &str, chain: &AggregatedChain) -> Result<AssetMetrics> {
        let walls = WallLevelExtractor::new(self.config).extract(
            &chain.strikes,
            chain.last_price,
            self.window,
        )?;
        Ok(MetricsAssembler::assemble(asset_id, chain, None, walls))
    }

    /// Fan out one computation per snapshot, join, then merge. A failing
    /// asset is reported in `failures` and does not affect the others.
    pub fn analyze_all(&self, snapshots: &[OptionChainSnapshot]) -> BatchOutcome {
        let results: Vec<(String, Result<AssetAnalysis>)> = snapshots
            .par_iter()
            .map(|snapshot| (snapshot.asset_id.clone(), self.analyze(snapshot)))
            .collect();

        let mut outcome = BatchOutcome::default();
        for (asset, result) in results {
            match result {
                Ok(analysis) => outcome.analyses.push(analysis),
                Err(e) => {
                    warn!(asset = %asset, error = %e, "asset skipped");
                    outcome.failures.push((asset, e));
                }
            }
        }
        outcome.book =
            MetricsAssembler::merge(outcome.analyses.iter().map(|a| a.metrics.clone()));
        outcome
    }
}
