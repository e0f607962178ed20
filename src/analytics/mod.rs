pub mod aggregate;
pub mod assemble;
pub mod calendar;
pub mod flip;
pub mod levels;

pub use aggregate::{AggregatedChain, StrikeGexAggregator};
pub use assemble::{AssetAnalysis, AssetPipeline, BatchOutcome, MetricsAssembler};
pub use flip::GammaFlipSolver;
pub use levels::{WallLevelExtractor, WallLevels};
