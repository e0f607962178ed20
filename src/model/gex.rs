use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::strike::StrikeKey;

/// Per-expiration GEX detail at one strike. This is the unit persisted in
/// the processed artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StrikeLead {
    pub expiration_date: NaiveDate,
    pub gex_at_call: f64,
    pub gex_at_put: f64,
    pub gamma_exposure_result: f64,
    pub call_open_interest: f64,
    pub put_open_interest: f64,
    pub call_gamma_value: f64,
    pub put_gamma_value: f64,
}

/// Call, put and total GEX at one strike, summed over expirations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeGex {
    pub strike: StrikeKey,
    pub call_gex: f64,
    pub put_gex: f64,
    pub total_gex: f64,
}

impl StrikeGex {
    pub fn new(strike: StrikeKey, call_gex: f64, put_gex: f64) -> Self {
        Self {
            strike,
            call_gex,
            put_gex,
            total_gex: call_gex + put_gex,
        }
    }

    pub fn from_leads(strike: StrikeKey, leads: &[StrikeLead]) -> Self {
        let call_gex = leads.iter().map(|l| l.gex_at_call).sum();
        let put_gex = leads.iter().map(|l| l.gex_at_put).sum();
        Self::new(strike, call_gex, put_gex)
    }
}
