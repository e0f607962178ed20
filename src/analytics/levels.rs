use std::cmp::Ordering;
use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::AnalyticsConfig;
use crate::error::{GexError, Result};
use crate::model::{StrikeGex, StrikeKey};

/// Wall strikes and ranked secondary levels inside the focus window.
#[derive(Debug, Clone, PartialEq)]
pub struct WallLevels {
    pub call_wall: StrikeKey,
    pub put_wall: StrikeKey,
    pub top_calls: Vec<Decimal>,
    pub top_puts: Vec<Decimal>,
}

/// Round a strike to the nearest multiple of `step`, halves to even.
pub fn round_strike_to_step(strike: Decimal, step: Decimal) -> Decimal {
    (strike / step).round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven) * step
}

/// Index of the strike closest to `last_price`; an exact match always wins
/// and equal distances resolve to the lower strike.
pub fn nearest_strike_index(strikes: &[StrikeGex], last_price: Decimal) -> Option<usize> {
    if let Some(exact) = strikes.iter().position(|g| g.strike.value() == last_price) {
        return Some(exact);
    }
    strikes
        .iter()
        .enumerate()
        .min_by_key(|(_, g)| (g.strike.value() - last_price).abs())
        .map(|(i, _)| i)
}

/// Up to `window` strikes on each side of the at-the-money strike, in
/// ascending strike order.
pub fn focus_window(
    strikes: &BTreeMap<StrikeKey, StrikeGex>,
    last_price: Decimal,
    window: usize,
) -> Vec<StrikeGex> {
    let ordered: Vec<StrikeGex> = strikes.values().copied().collect();
    let Some(center) = nearest_strike_index(&ordered, last_price) else {
        return Vec::new();
    };
    let start = center.saturating_sub(window);
    let end = (center + window).min(ordered.len() - 1);
    ordered[start..=end].to_vec()
}

/// First strike (ascending) whose total compares strictly better than every
/// earlier one.
fn first_extreme(window: &[StrikeGex], better: impl Fn(f64, f64) -> bool) -> Option<StrikeKey> {
    let mut best: Option<&StrikeGex> = None;
    for gex in window {
        match best {
            Some(current) if !better(gex.total_gex, current.total_gex) => {}
            _ => best = Some(gex),
        }
    }
    best.map(|g| g.strike)
}

/// Selects call/put walls and the ranked levels behind them.
pub struct WallLevelExtractor<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> WallLevelExtractor<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn extract(
        &self,
        strikes: &BTreeMap<StrikeKey, StrikeGex>,
        last_price: Decimal,
        window: usize,
    ) -> Result<WallLevels> {
        let focus = focus_window(strikes, last_price, window);

        let call_wall = first_extreme(&focus, |a, b| a > b).ok_or(GexError::EmptyChain)?;
        let put_wall = first_extreme(&focus, |a, b| a < b).ok_or(GexError::EmptyChain)?;

        let top_calls = self.ranked_levels(&focus, call_wall, |total| total > 0.0);
        let top_puts = self.ranked_levels(&focus, put_wall, |total| total < 0.0);

        Ok(WallLevels {
            call_wall,
            put_wall,
            top_calls,
            top_puts,
        })
    }

    /// Rank one side by descending magnitude (stable, lowest strike first on
    /// ties), drop the leader and keep the next levels rounded to the step.
    /// A rounded level equal to the wall or to an earlier level is skipped.
    fn ranked_levels(
        &self,
        focus: &[StrikeGex],
        wall: StrikeKey,
        side: impl Fn(f64) -> bool,
    ) -> Vec<Decimal> {
        let mut ranked: Vec<&StrikeGex> = focus.iter().filter(|g| side(g.total_gex)).collect();
        ranked.sort_by(|a, b| {
            b.total_gex
                .abs()
                .partial_cmp(&a.total_gex.abs())
                .unwrap_or(Ordering::Equal)
        });

        let step = self.config.rounding_step();
        let mut levels: Vec<Decimal> = Vec::with_capacity(self.config.top_levels);
        for gex in ranked.into_iter().skip(1) {
            if levels.len() == self.config.top_levels {
                break;
            }
            let level = round_strike_to_step(gex.strike.value(), step);
            if level == wall.value() || levels.contains(&level) {
                continue;
            }
            levels.push(level);
        }
        levels
    }
}
