use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::config::AnalyticsConfig;
use crate::error::{GexError, Result};
use crate::model::{OptionChainSnapshot, OptionSide, StrikeGex, StrikeKey, StrikeLead};

/// Per-strike GEX for one snapshot, with the per-expiration detail it was
/// summed from.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedChain {
    pub last_price: Decimal,
    pub leads: BTreeMap<StrikeKey, Vec<StrikeLead>>,
    pub strikes: BTreeMap<StrikeKey, StrikeGex>,
}

impl AggregatedChain {
    /// Rebuild the strike totals from per-expiration leads.
    pub fn from_leads(last_price: Decimal, leads: BTreeMap<StrikeKey, Vec<StrikeLead>>) -> Self {
        let strikes = leads
            .iter()
            .map(|(strike, leads)| (*strike, StrikeGex::from_leads(*strike, leads)))
            .collect();
        Self {
            last_price,
            leads,
            strikes,
        }
    }
}

/// GEX of one leg: `gamma * open_interest * (±multiplier) * last_price`.
pub fn leg_gex(gamma: f64, open_interest: f64, side: OptionSide, multiplier: f64, last_price: f64) -> f64 {
    gamma * open_interest * (side.sign() * multiplier) * last_price
}

/// Turns raw option rows into per-strike call/put/total GEX.
pub struct StrikeGexAggregator<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> StrikeGexAggregator<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn aggregate(&self, snapshot: &OptionChainSnapshot, zero_dte: bool) -> Result<AggregatedChain> {
        let last_price = snapshot
            .last_price
            .to_f64()
            .ok_or_else(|| GexError::parse("last_price", snapshot.last_price.to_string()))?;
        let multiplier = self.config.contract_multiplier;

        let mut seen = HashSet::new();
        let mut leads: BTreeMap<StrikeKey, Vec<StrikeLead>> = BTreeMap::new();
        let mut skipped = 0usize;

        for row in &snapshot.rows {
            if zero_dte && row.expiration_date != snapshot.as_of_date {
                skipped += 1;
                continue;
            }

            let strike = StrikeKey::new(row.strike, self.config.strike_scale)?;
            if !seen.insert((strike, row.expiration_date)) {
                return Err(GexError::DuplicateQuote {
                    strike,
                    expiration: row.expiration_date,
                });
            }

            let gex_at_call = leg_gex(
                row.gamma_call,
                row.open_interest_call,
                OptionSide::Call,
                multiplier,
                last_price,
            );
            let gex_at_put = leg_gex(
                row.gamma_put,
                row.open_interest_put,
                OptionSide::Put,
                multiplier,
                last_price,
            );

            leads.entry(strike).or_default().push(StrikeLead {
                expiration_date: row.expiration_date,
                gex_at_call,
                gex_at_put,
                gamma_exposure_result: gex_at_call + gex_at_put,
                call_open_interest: row.open_interest_call,
                put_open_interest: row.open_interest_put,
                call_gamma_value: row.gamma_call,
                put_gamma_value: row.gamma_put,
            });
        }

        debug!(
            asset = %snapshot.asset_id,
            strikes = leads.len(),
            skipped,
            zero_dte,
            "aggregated strike GEX"
        );

        Ok(AggregatedChain::from_leads(snapshot.last_price, leads))
    }
}
