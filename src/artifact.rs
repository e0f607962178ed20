use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analytics::AggregatedChain;
use crate::error::{GexError, Result};
use crate::model::{StrikeKey, StrikeLead};

/// Processed intermediate artifact, one file per snapshot: per-expiration
/// leads keyed by canonical strike text, plus the last price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessedArtifact {
    #[serde(flatten)]
    pub strikes: BTreeMap<String, Vec<StrikeLead>>,
    pub last_price: f64,
}

impl ProcessedArtifact {
    pub fn from_chain(chain: &AggregatedChain) -> Self {
        Self {
            strikes: chain
                .leads
                .iter()
                .map(|(strike, leads)| (strike.to_string(), leads.clone()))
                .collect(),
            last_price: chain.last_price.to_f64().unwrap_or_default(),
        }
    }

    /// Rebuild the aggregated chain. Keys are re-canonicalised, so an
    /// artifact written by hand with `"650"` and `"650.0"` merges both
    /// lists under one strike.
    pub fn into_chain(self, strike_scale: u32) -> Result<AggregatedChain> {
        let last_price = Decimal::from_f64(self.last_price)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| GexError::parse("last_price", self.last_price.to_string()))?;

        let mut leads: BTreeMap<StrikeKey, Vec<StrikeLead>> = BTreeMap::new();
        for (text, entries) in self.strikes {
            let strike = StrikeKey::parse(&text, strike_scale)?;
            let bucket = leads.entry(strike).or_default();
            for lead in entries {
                if bucket.iter().any(|l| l.expiration_date == lead.expiration_date) {
                    return Err(GexError::DuplicateQuote {
                        strike,
                        expiration: lead.expiration_date,
                    });
                }
                bucket.push(lead);
            }
        }

        Ok(AggregatedChain::from_leads(last_price, leads))
    }

    pub fn write(&self, dir: &Path, name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(artifact_file_name(name));
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        info!(path = %path.display(), strikes = self.strikes.len(), "stored processed artifact");
        Ok(path)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

pub fn artifact_file_name(name: &str) -> String {
    format!("processed_{name}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn lead(day: u32, call: f64, put: f64) -> StrikeLead {
        StrikeLead {
            expiration_date: NaiveDate::from_ymd_opt(2025, 8, day).unwrap(),
            gex_at_call: call,
            gex_at_put: put,
            gamma_exposure_result: call + put,
            call_open_interest: 1.0,
            put_open_interest: 1.0,
            call_gamma_value: 0.01,
            put_gamma_value: 0.01,
        }
    }

    #[test]
    fn test_wire_shape() {
        let artifact = ProcessedArtifact {
            strikes: BTreeMap::from([("650.00".to_string(), vec![lead(22, 5.0, -2.0)])]),
            last_price: 650.0,
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["last_price"], 650.0);
        assert_eq!(json["650.00"][0]["expiration_date"], "2025-08-22");
        assert_eq!(json["650.00"][0]["gex_at_call"], 5.0);
        assert_eq!(json["650.00"][0]["gamma_exposure_result"], 3.0);
    }

    #[test]
    fn test_inconsistent_keys_merge() {
        let text = r#"{
            "650": [{"expiration_date": "2025-08-22", "gex_at_call": 5.0, "gex_at_put": -2.0,
                     "gamma_exposure_result": 3.0, "call_open_interest": 1.0, "put_open_interest": 1.0,
                     "call_gamma_value": 0.01, "put_gamma_value": 0.01}],
            "650.0": [{"expiration_date": "2025-08-25", "gex_at_call": 1.0, "gex_at_put": -1.5,
                     "gamma_exposure_result": -0.5, "call_open_interest": 1.0, "put_open_interest": 1.0,
                     "call_gamma_value": 0.01, "put_gamma_value": 0.01}],
            "last_price": 650.0
        }"#;
        let artifact: ProcessedArtifact = serde_json::from_str(text).unwrap();
        let chain = artifact.into_chain(2).unwrap();
        assert_eq!(chain.strikes.len(), 1);
        let gex = chain.strikes.values().next().unwrap();
        assert_eq!(gex.call_gex, 6.0);
        assert_eq!(gex.put_gex, -3.5);
        assert_eq!(gex.total_gex, 2.5);
    }

    #[test]
    fn test_colliding_expirations_fail() {
        let artifact = ProcessedArtifact {
            strikes: BTreeMap::from([
                ("650".to_string(), vec![lead(22, 5.0, -2.0)]),
                ("650.00".to_string(), vec![lead(22, 1.0, -1.0)]),
            ]),
            last_price: 650.0,
        };
        assert!(matches!(
            artifact.into_chain(2),
            Err(GexError::DuplicateQuote { .. })
        ));
    }
}
