use std::path::Path;

use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{GexError, Result};

/// Numeric knobs of the analytics core.
///
/// Every constant that moves the flip point or the wall selection lives here
/// so two runs can be reproduced from the same config file. Missing fields
/// fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyticsConfig {
    /// Contracts-to-shares multiplier applied to every GEX leg.
    #[serde(default = "default_contract_multiplier")]
    pub contract_multiplier: f64,

    /// Length of the year, in business days, used for time-to-expiry.
    #[serde(default = "default_business_days_per_year")]
    pub business_days_per_year: f64,

    /// Number of spot levels in the gamma sweep.
    #[serde(default = "default_grid_points")]
    pub grid_points: usize,

    /// Lowest sweep level as a fraction of last price.
    #[serde(default = "default_grid_lower_ratio")]
    pub grid_lower_ratio: f64,

    /// Highest sweep level as a fraction of last price.
    #[serde(default = "default_grid_upper_ratio")]
    pub grid_upper_ratio: f64,

    /// Scale applied to the aggregate gamma curve. Has no effect on where
    /// the curve changes sign.
    #[serde(default = "default_curve_scale")]
    pub curve_scale: f64,

    /// Flip price and secondary levels are rounded to a multiple of this.
    #[serde(default = "default_level_rounding_step")]
    pub level_rounding_step: u32,

    /// Strikes kept on each side of the at-the-money strike.
    #[serde(default = "default_focus_window")]
    pub focus_window: usize,

    /// Secondary levels reported per side, wall excluded.
    #[serde(default = "default_top_levels")]
    pub top_levels: usize,

    /// Decimal places of a canonical strike key.
    #[serde(default = "default_strike_scale")]
    pub strike_scale: u32,
}

fn default_contract_multiplier() -> f64 {
    100.0
}
fn default_business_days_per_year() -> f64 {
    262.0
}
fn default_grid_points() -> usize {
    60
}
fn default_grid_lower_ratio() -> f64 {
    0.8
}
fn default_grid_upper_ratio() -> f64 {
    1.2
}
fn default_curve_scale() -> f64 {
    1e-9
}
fn default_level_rounding_step() -> u32 {
    5
}
fn default_focus_window() -> usize {
    FocusWindow::Standard.size()
}
fn default_top_levels() -> usize {
    3
}
fn default_strike_scale() -> u32 {
    2
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            contract_multiplier: default_contract_multiplier(),
            business_days_per_year: default_business_days_per_year(),
            grid_points: default_grid_points(),
            grid_lower_ratio: default_grid_lower_ratio(),
            grid_upper_ratio: default_grid_upper_ratio(),
            curve_scale: default_curve_scale(),
            level_rounding_step: default_level_rounding_step(),
            focus_window: default_focus_window(),
            top_levels: default_top_levels(),
            strike_scale: default_strike_scale(),
        }
    }
}

impl AnalyticsConfig {
    /// Load a config from a JSON file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AnalyticsConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_points < 2 {
            return Err(GexError::InvalidConfig(format!(
                "grid_points must be at least 2, got {}",
                self.grid_points
            )));
        }
        if !(self.grid_lower_ratio > 0.0 && self.grid_lower_ratio < self.grid_upper_ratio) {
            return Err(GexError::InvalidConfig(format!(
                "grid ratios must satisfy 0 < lower < upper, got {}..{}",
                self.grid_lower_ratio, self.grid_upper_ratio
            )));
        }
        if self.business_days_per_year <= 0.0 {
            return Err(GexError::InvalidConfig(
                "business_days_per_year must be positive".into(),
            ));
        }
        if self.contract_multiplier <= 0.0 {
            return Err(GexError::InvalidConfig(
                "contract_multiplier must be positive".into(),
            ));
        }
        if self.level_rounding_step == 0 {
            return Err(GexError::InvalidConfig(
                "level_rounding_step must be positive".into(),
            ));
        }
        if self.strike_scale > 8 {
            return Err(GexError::InvalidConfig(format!(
                "strike_scale {} is beyond any listed strike precision",
                self.strike_scale
            )));
        }
        Ok(())
    }

    pub fn rounding_step(&self) -> Decimal {
        Decimal::from(self.level_rounding_step)
    }
}

/// Preset focus-window sizes, in strikes on each side of the money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FocusWindow {
    Narrow,
    Standard,
    Wide,
}

impl FocusWindow {
    pub const fn size(self) -> usize {
        match self {
            FocusWindow::Narrow => 30,
            FocusWindow::Standard => 50,
            FocusWindow::Wide => 100,
        }
    }
}
