use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::gex::StrikeGex;
use super::strike::StrikeKey;

/// Outcome of the zero-crossing search over the gamma curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlipOutcome {
    Found(f64),
    NotFound,
}

impl FlipOutcome {
    pub fn price(self) -> Option<f64> {
        match self {
            FlipOutcome::Found(price) => Some(price),
            FlipOutcome::NotFound => None,
        }
    }
}

/// The spot sweep behind a flip estimate, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct GammaProfile {
    pub levels: Vec<f64>,
    /// Aggregate call-minus-put gamma exposure at each level.
    pub total: Vec<f64>,
    /// Same curve without the nearest expiration.
    pub ex_next_expiry: Vec<f64>,
    /// Same curve without the next monthly (third Friday) expiration.
    pub ex_next_monthly: Vec<f64>,
    pub flip: FlipOutcome,
}

/// Everything the core derives for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetMetrics {
    pub asset_id: String,
    pub last_price: Decimal,
    pub strikes: BTreeMap<StrikeKey, StrikeGex>,
    pub call_wall_strike: StrikeKey,
    pub put_wall_strike: StrikeKey,
    pub flip_price: Option<f64>,
    pub top_calls: Vec<Decimal>,
    pub top_puts: Vec<Decimal>,
}

impl AssetMetrics {
    pub fn to_record(&self) -> MetricsRecord {
        MetricsRecord {
            strikes: self
                .strikes
                .iter()
                .map(|(strike, gex)| {
                    (
                        strike.to_string(),
                        StrikeGexRecord {
                            call: gex.call_gex,
                            put: gex.put_gex,
                            total: gex.total_gex,
                        },
                    )
                })
                .collect(),
            last_price: to_f64(self.last_price),
            call_wall_strike: self.call_wall_strike.to_f64(),
            put_wall_strike: self.put_wall_strike.to_f64(),
            flip_point: self.flip_price,
            top_calls: self.top_calls.iter().copied().map(to_f64).collect(),
            top_puts: self.top_puts.iter().copied().map(to_f64).collect(),
        }
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StrikeGexRecord {
    pub call: f64,
    pub put: f64,
    pub total: f64,
}

/// Wire form of [`AssetMetrics`] handed to rendering and messaging.
///
/// Strike entries sit at the top level of the object, next to the named
/// fields, keyed by their canonical text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricsRecord {
    #[serde(flatten)]
    pub strikes: BTreeMap<String, StrikeGexRecord>,
    pub last_price: f64,
    pub call_wall_strike: f64,
    pub put_wall_strike: f64,
    pub flip_point: Option<f64>,
    pub top_calls: Vec<f64>,
    pub top_puts: Vec<f64>,
}

/// Per-asset metrics merged into one hand-off mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsBook {
    assets: BTreeMap<String, AssetMetrics>,
}

impl MetricsBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one asset's metrics. A later record for the same asset replaces
    /// the earlier one.
    pub fn insert(&mut self, metrics: AssetMetrics) -> Option<AssetMetrics> {
        self.assets.insert(metrics.asset_id.clone(), metrics)
    }

    pub fn get(&self, asset_id: &str) -> Option<&AssetMetrics> {
        self.assets.get(asset_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetMetrics> {
        self.assets.values()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn to_records(&self) -> BTreeMap<String, MetricsRecord> {
        self.assets
            .iter()
            .map(|(asset, metrics)| (asset.clone(), metrics.to_record()))
            .collect()
    }
}

impl Extend<AssetMetrics> for MetricsBook {
    fn extend<I: IntoIterator<Item = AssetMetrics>>(&mut self, iter: I) {
        for metrics in iter {
            self.insert(metrics);
        }
    }
}

impl FromIterator<AssetMetrics> for MetricsBook {
    fn from_iter<I: IntoIterator<Item = AssetMetrics>>(iter: I) -> Self {
        let mut book = MetricsBook::new();
        book.extend(iter);
        book
    }
}

impl Serialize for MetricsBook {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_records().serialize(serializer)
    }
}
