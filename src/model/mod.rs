pub mod gex;
pub mod metrics;
pub mod snapshot;
pub mod strike;

pub use gex::{StrikeGex, StrikeLead};
pub use metrics::{AssetMetrics, FlipOutcome, GammaProfile, MetricsBook, MetricsRecord};
pub use snapshot::{OptionChainSnapshot, OptionRow, OptionSide};
pub use strike::StrikeKey;
