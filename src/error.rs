use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::StrikeKey;

#[derive(Debug, Error)]
pub enum GexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot parse {field} from `{value}`")]
    Parse { field: &'static str, value: String },

    #[error("Option chain is missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Duplicate quote for strike {strike} expiring {expiration}")]
    DuplicateQuote {
        strike: StrikeKey,
        expiration: NaiveDate,
    },

    #[error("Strike `{raw}` has more than {scale} decimal places")]
    StrikePrecision { raw: Decimal, scale: u32 },

    #[error("Option chain has no strikes to aggregate")]
    EmptyChain,

    #[error("Invalid analytics config: {0}")]
    InvalidConfig(String),
}

impl GexError {
    pub fn parse(field: &'static str, value: impl Into<String>) -> Self {
        GexError::Parse {
            field,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GexError>;
