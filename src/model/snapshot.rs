use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{GexError, Result};

/// Side of an option quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSide {
    Call,
    Put,
}

impl OptionSide {
    /// Dealer-positioning sign: calls contribute positive GEX, puts negative.
    pub const fn sign(self) -> f64 {
        match self {
            OptionSide::Call => 1.0,
            OptionSide::Put => -1.0,
        }
    }
}

/// One expiration's quote at one strike, both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRow {
    pub strike: Decimal,
    pub expiration_date: NaiveDate,
    pub implied_vol_call: f64,
    pub implied_vol_put: f64,
    pub open_interest_call: f64,
    pub open_interest_put: f64,
    pub gamma_call: f64,
    pub gamma_put: f64,
}

impl OptionRow {
    pub fn gamma(&self, side: OptionSide) -> f64 {
        match side {
            OptionSide::Call => self.gamma_call,
            OptionSide::Put => self.gamma_put,
        }
    }

    pub fn open_interest(&self, side: OptionSide) -> f64 {
        match side {
            OptionSide::Call => self.open_interest_call,
            OptionSide::Put => self.open_interest_put,
        }
    }

    pub fn implied_vol(&self, side: OptionSide) -> f64 {
        match side {
            OptionSide::Call => self.implied_vol_call,
            OptionSide::Put => self.implied_vol_put,
        }
    }
}

/// Option chain for one underlying as of one trading date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChainSnapshot {
    pub asset_id: String,
    pub last_price: Decimal,
    pub as_of_date: NaiveDate,
    pub rows: Vec<OptionRow>,
}

impl OptionChainSnapshot {
    /// Rows the pipeline should look at: all of them, or only those expiring
    /// on the snapshot date.
    pub fn rows_for(&self, zero_dte: bool) -> impl Iterator<Item = &OptionRow> {
        self.rows
            .iter()
            .filter(move |row| !zero_dte || row.expiration_date == self.as_of_date)
    }
}

/// Parse a quoted last price such as `"6,466.91"` as an exact decimal.
pub fn parse_last_price(text: &str) -> Result<Decimal> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    let price =
        Decimal::from_str(&cleaned).map_err(|_| GexError::parse("last_price", text))?;
    if price <= Decimal::ZERO {
        return Err(GexError::parse("last_price", text));
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_thousands_separator_is_exact() {
        assert_eq!(parse_last_price("6,466.91").unwrap(), dec!(6466.91));
        assert_eq!(parse_last_price(" 650.00 ").unwrap(), dec!(650.00));
    }

    #[test]
    fn test_malformed_price_fails() {
        for bad in ["", "n/a", "6.466,91.2", "-5", "0"] {
            let err = parse_last_price(bad).unwrap_err();
            assert!(
                matches!(err, GexError::Parse { field: "last_price", .. }),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_zero_dte_row_filter() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 22).unwrap();
        let row = |exp: NaiveDate| OptionRow {
            strike: dec!(650),
            expiration_date: exp,
            implied_vol_call: 0.2,
            implied_vol_put: 0.2,
            open_interest_call: 1.0,
            open_interest_put: 1.0,
            gamma_call: 0.01,
            gamma_put: 0.01,
        };
        let snapshot = OptionChainSnapshot {
            asset_id: "spy".into(),
            last_price: dec!(650),
            as_of_date: today,
            rows: vec![row(today), row(today.succ_opt().unwrap())],
        };
        assert_eq!(snapshot.rows_for(false).count(), 2);
        assert_eq!(snapshot.rows_for(true).count(), 1);
    }
}
