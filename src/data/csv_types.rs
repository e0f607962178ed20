use std::str::FromStr;

use chrono::NaiveDate;
use csv::StringRecord;
use rust_decimal::Decimal;

use crate::error::{GexError, Result};
use crate::model::OptionRow;

/// Expiration format used by the quote table export, e.g. `Fri Aug 22 2025`.
pub const EXPIRATION_FORMAT: &str = "%a %b %d %Y";

const EXPIRATION: &str = "Expiration Date";
const STRIKE: &str = "Strike";
const IV: &str = "IV";
const GAMMA: &str = "Gamma";
const OPEN_INTEREST: &str = "Open Interest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SideColumns {
    iv: usize,
    gamma: usize,
    open_interest: usize,
}

/// Column positions in a quote-table header.
///
/// Call and put blocks reuse the same names, so each side is located by
/// position relative to the `Strike` column: calls before it, puts after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CboeLayout {
    expiration: usize,
    strike: usize,
    call: SideColumns,
    put: SideColumns,
}

impl CboeLayout {
    pub fn from_headers(headers: &StringRecord) -> Result<Self> {
        let names: Vec<&str> = headers.iter().map(str::trim).collect();
        let mut missing = Vec::new();

        let position =
            |name: &str, mut range: std::ops::Range<usize>| range.find(|&i| names[i] == name);

        let strike = names.iter().position(|n| *n == STRIKE);
        let expiration = names.iter().position(|n| *n == EXPIRATION);
        if expiration.is_none() {
            missing.push(EXPIRATION.to_string());
        }
        let Some(strike) = strike else {
            missing.push(STRIKE.to_string());
            return Err(GexError::Schema { missing });
        };

        let mut side = |label: &str, range: std::ops::Range<usize>| {
            let found = [IV, GAMMA, OPEN_INTEREST].map(|name| {
                let index = position(name, range.clone());
                if index.is_none() {
                    missing.push(format!("{name} ({label})"));
                }
                index
            });
            match found {
                [Some(iv), Some(gamma), Some(open_interest)] => Some(SideColumns {
                    iv,
                    gamma,
                    open_interest,
                }),
                _ => None,
            }
        };

        let call = side("call", 0..strike);
        let put = side("put", strike + 1..names.len());

        match (expiration, call, put) {
            (Some(expiration), Some(call), Some(put)) => Ok(CboeLayout {
                expiration,
                strike,
                call,
                put,
            }),
            _ => Err(GexError::Schema { missing }),
        }
    }

    /// Required columns with their header labels.
    fn required(&self) -> [(String, usize); 8] {
        [
            (EXPIRATION.to_string(), self.expiration),
            (STRIKE.to_string(), self.strike),
            (format!("{IV} (call)"), self.call.iv),
            (format!("{GAMMA} (call)"), self.call.gamma),
            (format!("{OPEN_INTEREST} (call)"), self.call.open_interest),
            (format!("{IV} (put)"), self.put.iv),
            (format!("{GAMMA} (put)"), self.put.gamma),
            (format!("{OPEN_INTEREST} (put)"), self.put.open_interest),
        ]
    }

    /// Parse one quote row. A row that stops short of any required column
    /// is a schema error; a present but blank cell reads as zero.
    pub fn parse_row(&self, record: &StringRecord) -> Result<OptionRow> {
        let missing: Vec<String> = self
            .required()
            .into_iter()
            .filter(|(_, index)| *index >= record.len())
            .map(|(label, _)| label)
            .collect();
        if !missing.is_empty() {
            return Err(GexError::Schema { missing });
        }

        let cell = |i: usize| record.get(i).map(str::trim).unwrap_or("");

        let strike_text = cell(self.strike);
        let strike =
            Decimal::from_str(strike_text).map_err(|_| GexError::parse("strike", strike_text))?;

        let expiration_text = cell(self.expiration);
        let expiration_date = NaiveDate::parse_from_str(expiration_text, EXPIRATION_FORMAT)
            .map_err(|_| GexError::parse("expiration_date", expiration_text))?;

        Ok(OptionRow {
            strike,
            expiration_date,
            implied_vol_call: number("call IV", cell(self.call.iv))?,
            implied_vol_put: number("put IV", cell(self.put.iv))?,
            open_interest_call: number("call open interest", cell(self.call.open_interest))?,
            open_interest_put: number("put open interest", cell(self.put.open_interest))?,
            gamma_call: number("call gamma", cell(self.call.gamma))?,
            gamma_put: number("put gamma", cell(self.put.gamma))?,
        })
    }
}

/// Blank cells are quotes with nothing on them and count as zero.
fn number(field: &'static str, text: &str) -> Result<f64> {
    if text.is_empty() || text == "-" {
        return Ok(0.0);
    }
    let cleaned = text.replace(',', "");
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| GexError::parse(field, text))
}
