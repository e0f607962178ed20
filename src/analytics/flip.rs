use std::f64::consts::PI;

use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, info};

use super::calendar::{is_third_friday, years_to_expiry};
use crate::config::AnalyticsConfig;
use crate::model::{FlipOutcome, GammaProfile, OptionChainSnapshot, OptionSide};

fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes gamma with zero rates and dividends.
///
/// Non-positive time or volatility (and a degenerate spot or strike)
/// contribute nothing.
pub fn bs_gamma(spot: f64, strike: f64, vol: f64, t: f64) -> f64 {
    if t <= 0.0 || vol <= 0.0 || spot <= 0.0 || strike <= 0.0 {
        return 0.0;
    }
    let vol_sqrt_t = vol * t.sqrt();
    let d1 = ((spot / strike).ln() + 0.5 * vol * vol * t) / vol_sqrt_t;
    norm_pdf(d1) / (spot * vol_sqrt_t)
}

/// Dollar gamma exposure of `open_interest` contracts for a 1% spot move.
pub fn gamma_exposure(spot: f64, strike: f64, vol: f64, t: f64, open_interest: f64, multiplier: f64) -> f64 {
    open_interest * multiplier * spot * spot * 0.01 * bs_gamma(spot, strike, vol, t)
}

/// `points` evenly spaced values over `[lower, upper]`, both ends included.
pub fn linspace(lower: f64, upper: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![lower],
        n => {
            let step = (upper - lower) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { upper } else { lower + step * i as f64 })
                .collect()
        }
    }
}

/// First sign change of `curve` in ascending-level order, linearly
/// interpolated between the two samples that bracket it.
///
/// Samples that sit exactly on zero neither open nor close a bracket; if
/// the sign flips across a run of exact zeros, the first zero level is the
/// root.
pub fn find_zero_crossing(levels: &[f64], curve: &[f64]) -> Option<f64> {
    let mut previous: Option<usize> = None;
    for (i, &value) in curve.iter().enumerate().take(levels.len()) {
        if value == 0.0 || !value.is_finite() {
            continue;
        }
        if let Some(p) = previous {
            let before = curve[p];
            if before.signum() != value.signum() {
                if i == p + 1 {
                    let (s_neg, g_neg) = (levels[p], before);
                    let (s_pos, g_pos) = (levels[i], value);
                    return Some(s_pos - (s_pos - s_neg) * g_pos / (g_pos - g_neg));
                }
                return Some(levels[p + 1]);
            }
        }
        previous = Some(i);
    }
    None
}

/// Round to the nearest multiple of `step`, halves to even.
pub fn round_to_step(value: f64, step: f64) -> f64 {
    (value / step).round_ties_even() * step
}

struct Leg {
    strike: f64,
    expiration: NaiveDate,
    t: f64,
    call_vol: f64,
    put_vol: f64,
    call_oi: f64,
    put_oi: f64,
}

impl Leg {
    fn net_exposure(&self, spot: f64, multiplier: f64) -> f64 {
        let call = gamma_exposure(spot, self.strike, self.call_vol, self.t, self.call_oi, multiplier);
        let put = gamma_exposure(spot, self.strike, self.put_vol, self.t, self.put_oi, multiplier);
        call - put
    }
}

/// Sweeps a synthetic spot grid through Black-Scholes gamma and locates the
/// price where aggregate dealer gamma changes sign.
pub struct GammaFlipSolver<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> GammaFlipSolver<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn spot_grid(&self, last_price: f64) -> Vec<f64> {
        linspace(
            self.config.grid_lower_ratio * last_price,
            self.config.grid_upper_ratio * last_price,
            self.config.grid_points,
        )
    }

    pub fn solve(&self, snapshot: &OptionChainSnapshot, zero_dte: bool) -> GammaProfile {
        let last_price = snapshot.last_price.to_f64().unwrap_or_default();
        let multiplier = self.config.contract_multiplier;

        let legs: Vec<Leg> = snapshot
            .rows_for(zero_dte)
            .map(|row| Leg {
                strike: row.strike.to_f64().unwrap_or_default(),
                expiration: row.expiration_date,
                t: years_to_expiry(
                    snapshot.as_of_date,
                    row.expiration_date,
                    self.config.business_days_per_year,
                ),
                call_vol: row.implied_vol(OptionSide::Call),
                put_vol: row.implied_vol(OptionSide::Put),
                call_oi: row.open_interest(OptionSide::Call),
                put_oi: row.open_interest(OptionSide::Put),
            })
            .collect();

        let next_expiry = legs.iter().map(|l| l.expiration).min();
        let next_monthly = legs
            .iter()
            .map(|l| l.expiration)
            .filter(|d| is_third_friday(*d))
            .min();

        let levels = self.spot_grid(last_price);
        let scale = self.config.curve_scale;

        // Grid points are independent; the crossing scan below is not.
        let samples: Vec<(f64, f64, f64)> = levels
            .par_iter()
            .map(|&spot| {
                let mut total = 0.0;
                let mut ex_next = 0.0;
                let mut ex_monthly = 0.0;
                for leg in &legs {
                    let exposure = leg.net_exposure(spot, multiplier);
                    total += exposure;
                    if Some(leg.expiration) != next_expiry {
                        ex_next += exposure;
                    }
                    if Some(leg.expiration) != next_monthly {
                        ex_monthly += exposure;
                    }
                }
                (total * scale, ex_next * scale, ex_monthly * scale)
            })
            .collect();

        let total: Vec<f64> = samples.iter().map(|s| s.0).collect();
        let ex_next_expiry = samples.iter().map(|s| s.1).collect();
        let ex_next_monthly = samples.iter().map(|s| s.2).collect();

        let step = f64::from(self.config.level_rounding_step);
        let flip = match find_zero_crossing(&levels, &total) {
            Some(root) => {
                let price = round_to_step(root, step);
                info!(asset = %snapshot.asset_id, root, flip = price, "gamma flip located");
                FlipOutcome::Found(price)
            }
            None => {
                info!(asset = %snapshot.asset_id, "no gamma sign change across the spot grid");
                FlipOutcome::NotFound
            }
        };
        debug!(asset = %snapshot.asset_id, legs = legs.len(), points = levels.len(), "gamma sweep done");

        GammaProfile {
            levels,
            total,
            ex_next_expiry,
            ex_next_monthly,
            flip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OptionRow;
    use rust_decimal::Decimal;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn row(strike: i64, expiration: NaiveDate, vol: f64, call_oi: f64, put_oi: f64) -> OptionRow {
        OptionRow {
            strike: Decimal::from(strike),
            expiration_date: expiration,
            implied_vol_call: vol,
            implied_vol_put: vol,
            open_interest_call: call_oi,
            open_interest_put: put_oi,
            gamma_call: 0.0,
            gamma_put: 0.0,
        }
    }

    fn chain(rows: Vec<OptionRow>) -> OptionChainSnapshot {
        OptionChainSnapshot {
            asset_id: "iwm".into(),
            last_price: Decimal::from(100),
            as_of_date: day(8, 22),
            rows,
        }
    }

    #[test]
    fn test_zero_dte_ignores_later_expirations() {
        let same_day = vec![
            row(90, day(8, 22), 0.5, 100.0, 20_000.0),
            row(110, day(8, 22), 0.5, 20_000.0, 100.0),
        ];
        let mut with_later = same_day.clone();
        with_later.push(row(100, day(9, 19), 0.2, 0.0, 1_000_000.0));

        let config = AnalyticsConfig::default();
        let solver = GammaFlipSolver::new(&config);
        let filtered = solver.solve(&chain(with_later.clone()), true);

        assert_eq!(filtered, solver.solve(&chain(same_day), true));
        assert!(matches!(filtered.flip, FlipOutcome::Found(_)));
        assert_ne!(solver.solve(&chain(with_later), false).total, filtered.total);
    }

    #[test]
    fn test_diagnostic_curves_drop_one_expiration() {
        // 2025-08-29 is the nearest expiry, 2025-09-19 the third Friday.
        let weekly = row(100, day(8, 29), 0.25, 1_000.0, 200.0);
        let monthly = row(105, day(9, 19), 0.2, 300.0, 1_500.0);

        let config = AnalyticsConfig::default();
        let solver = GammaFlipSolver::new(&config);
        let both = solver.solve(&chain(vec![weekly.clone(), monthly.clone()]), false);
        let weekly_only = solver.solve(&chain(vec![weekly]), false);
        let monthly_only = solver.solve(&chain(vec![monthly]), false);

        assert_eq!(both.levels, weekly_only.levels);
        for i in 0..both.levels.len() {
            let expected = weekly_only.total[i] + monthly_only.total[i];
            assert!((both.total[i] - expected).abs() <= 1e-12 * expected.abs().max(1e-12));
            assert!((both.ex_next_expiry[i] - monthly_only.total[i]).abs() <= 1e-15);
            assert!((both.ex_next_monthly[i] - weekly_only.total[i]).abs() <= 1e-15);
        }
        assert!(both.total.iter().any(|v| *v != 0.0));
    }

    #[test]
    fn test_linspace_endpoints() {
        let grid = linspace(520.0, 780.0, 60);
        assert_eq!(grid.len(), 60);
        assert_eq!(grid[0], 520.0);
        assert_eq!(grid[59], 780.0);
        let step = grid[1] - grid[0];
        assert!((step - 260.0 / 59.0).abs() < 1e-9);
    }

    #[test]
    fn test_gamma_guards() {
        assert_eq!(bs_gamma(650.0, 650.0, 0.0, 0.1), 0.0);
        assert_eq!(bs_gamma(650.0, 650.0, -0.2, 0.1), 0.0);
        assert_eq!(bs_gamma(650.0, 650.0, 0.2, 0.0), 0.0);
        assert_eq!(bs_gamma(650.0, 650.0, 0.2, -1.0), 0.0);
    }

    #[test]
    fn test_atm_gamma_matches_closed_form() {
        // At the money d1 = 0.5 * vol * sqrt(t)
        let (s, vol, t): (f64, f64, f64) = (100.0, 0.2, 0.25);
        let d1 = 0.5 * vol * t.sqrt();
        let expected = (-0.5 * d1 * d1).exp() / (2.0 * PI).sqrt() / (s * vol * t.sqrt());
        assert!((bs_gamma(s, s, vol, t) - expected).abs() < 1e-12);
        assert!(bs_gamma(s, s, vol, t) > bs_gamma(s, 140.0, vol, t));
    }

    #[test]
    fn test_crossing_interpolates() {
        let levels = [100.0, 110.0, 120.0, 130.0];
        let curve = [-3.0, -1.0, 1.0, 2.0];
        assert_eq!(find_zero_crossing(&levels, &curve), Some(115.0));
    }

    #[test]
    fn test_lowest_crossing_wins() {
        let levels = [100.0, 110.0, 120.0, 130.0];
        let curve = [1.0, -1.0, -1.0, 1.0];
        assert_eq!(find_zero_crossing(&levels, &curve), Some(105.0));
    }

    #[test]
    fn test_no_crossing() {
        let levels = [100.0, 110.0, 120.0];
        assert_eq!(find_zero_crossing(&levels, &[0.0, 1.0, 2.0]), None);
        assert_eq!(find_zero_crossing(&levels, &[-1.0, -2.0, 0.0]), None);
        assert_eq!(find_zero_crossing(&levels, &[0.0, 0.0, 0.0]), None);
        assert_eq!(find_zero_crossing(&[], &[]), None);
    }

    #[test]
    fn test_crossing_through_exact_zero() {
        let levels = [100.0, 110.0, 120.0];
        assert_eq!(find_zero_crossing(&levels, &[-1.0, 0.0, 1.0]), Some(110.0));
    }

    #[test]
    fn test_round_to_step() {
        assert_eq!(round_to_step(643.1, 5.0), 645.0);
        assert_eq!(round_to_step(642.4, 5.0), 640.0);
        assert_eq!(round_to_step(647.5, 5.0), 650.0);
        assert_eq!(round_to_step(652.5, 5.0), 650.0);
    }
}
