pub mod csv_types;

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{GexError, Result};
use crate::model::snapshot::parse_last_price;
use crate::model::OptionChainSnapshot;

use csv_types::CboeLayout;

/// Lines of free-form metadata above the quote-table header.
const METADATA_LINES: usize = 3;

/// Caller-supplied facts that override what the export's metadata says.
#[derive(Debug, Clone, Default)]
pub struct SnapshotOverrides {
    pub asset_id: Option<String>,
    pub last_price: Option<String>,
    pub as_of: Option<NaiveDate>,
}

/// Derive an asset identifier from an export filename:
/// `cboe_spx_quotedata_all_22-08-25.csv` becomes `spx`.
pub fn asset_id_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = stem.strip_prefix("processed_").unwrap_or(&stem);
    let stem = stem.strip_prefix("cboe_").unwrap_or(stem);
    stem.split("_quotedata").next().unwrap_or(stem).to_lowercase()
}

/// Load a quote-table CSV export into a snapshot.
pub fn load_cboe_snapshot(path: &Path, overrides: &SnapshotOverrides) -> Result<OptionChainSnapshot> {
    let contents = std::fs::read_to_string(path)?;
    let asset_id = overrides
        .asset_id
        .clone()
        .unwrap_or_else(|| asset_id_from_path(path));
    let snapshot = parse_cboe_snapshot(&contents, &asset_id, overrides)?;
    info!(
        asset = %snapshot.asset_id,
        rows = snapshot.rows.len(),
        last_price = %snapshot.last_price,
        as_of = %snapshot.as_of_date,
        file = %path.display(),
        "loaded option chain"
    );
    Ok(snapshot)
}

/// Parse the text of a quote-table export. Any missing column rejects the
/// whole snapshot; no partial chain is returned.
pub fn parse_cboe_snapshot(
    contents: &str,
    asset_id: &str,
    overrides: &SnapshotOverrides,
) -> Result<OptionChainSnapshot> {
    let mut parts = contents.splitn(METADATA_LINES + 1, '\n');
    let metadata: Vec<&str> = parts.by_ref().take(METADATA_LINES).collect();
    let body = parts.next().unwrap_or("");

    let last_price = match &overrides.last_price {
        Some(text) => parse_last_price(text)?,
        None => metadata_last_price(&metadata)?,
    };
    let as_of_date = match overrides.as_of {
        Some(date) => date,
        None => metadata_date(&metadata)?,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());
    let layout = CboeLayout::from_headers(reader.headers()?)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(layout.parse_row(&record)?);
    }

    Ok(OptionChainSnapshot {
        asset_id: asset_id.to_string(),
        last_price,
        as_of_date,
        rows,
    })
}

/// `Last: 6,466.91` in the first metadata line.
fn metadata_last_price(metadata: &[&str]) -> Result<Decimal> {
    let line = metadata.first().copied().unwrap_or("");
    let (_, rest) = line
        .split_once("Last:")
        .ok_or_else(|| GexError::parse("last_price", line))?;
    // The value may carry a thousands separator, so a comma alone does not
    // end it.
    let value: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    parse_last_price(value.trim_end_matches(','))
}

/// `Date: August 22, 2025 at 4:15 PM EDT` in the third metadata line.
fn metadata_date(metadata: &[&str]) -> Result<NaiveDate> {
    let line = metadata.get(2).copied().unwrap_or("");
    let text = line
        .split_once("Date:")
        .map(|(_, rest)| rest.split(" at ").next().unwrap_or(rest))
        .unwrap_or("")
        .trim()
        .trim_matches('"')
        .trim();
    NaiveDate::parse_from_str(text, "%B %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(text, "%b %d, %Y"))
        .map_err(|_| GexError::parse("as_of_date", line.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const EXPORT: &str = "\
SPDR S&P 500 ETF Trust,Last: 645.31,Change: 6.2
Bid: 645.30,Ask: 645.33,Size: 1*1,Volume: 79866932
\"Date: August 22, 2025 at 4:15 PM EDT\",Bid: 645.30,Ask: 645.33
Expiration Date,Calls,Last Sale,Net,Bid,Ask,Volume,IV,Delta,Gamma,Open Interest,Strike,Puts,Last Sale,Net,Bid,Ask,Volume,IV,Delta,Gamma,Open Interest
Fri Aug 22 2025,C640,5.3,0,5.2,5.4,10,0.15,0.9,0.02,1200,640,P640,0.1,0,0.1,0.2,10,0.2,-0.1,0.01,900
Fri Aug 22 2025,C650,0.2,0,0.1,0.3,10,0.14,0.1,0.03,1500,650,P650,4.8,0,4.7,4.9,10,0.19,-0.9,0.02,700
Mon Aug 25 2025,C650,1.1,0,1.0,1.2,10,0.16,0.3,0.01,300,650.00,P650,5.9,0,5.8,6.0,10,0.2,-0.7,0.015,400
";

    #[test]
    fn test_parses_export_with_metadata() {
        let snapshot = parse_cboe_snapshot(EXPORT, "spy", &SnapshotOverrides::default()).unwrap();
        assert_eq!(snapshot.asset_id, "spy");
        assert_eq!(snapshot.last_price, dec!(645.31));
        assert_eq!(snapshot.as_of_date, NaiveDate::from_ymd_opt(2025, 8, 22).unwrap());
        assert_eq!(snapshot.rows.len(), 3);
        assert_eq!(snapshot.rows[2].strike, dec!(650.00));
    }

    #[test]
    fn test_overrides_win() {
        let overrides = SnapshotOverrides {
            asset_id: None,
            last_price: Some("6,466.91".into()),
            as_of: NaiveDate::from_ymd_opt(2025, 8, 25),
        };
        let snapshot = parse_cboe_snapshot(EXPORT, "spx", &overrides).unwrap();
        assert_eq!(snapshot.last_price, dec!(6466.91));
        assert_eq!(snapshot.as_of_date, NaiveDate::from_ymd_opt(2025, 8, 25).unwrap());
    }

    #[test]
    fn test_malformed_last_price_aborts() {
        let overrides = SnapshotOverrides {
            last_price: Some("six hundred".into()),
            ..Default::default()
        };
        assert!(matches!(
            parse_cboe_snapshot(EXPORT, "spy", &overrides),
            Err(GexError::Parse { field: "last_price", .. })
        ));
    }

    #[test]
    fn test_schema_drift_rejects_snapshot() {
        let drifted = EXPORT.replace(",Gamma,Open Interest\n", ",Gamma2,Open Interest\n");
        assert!(matches!(
            parse_cboe_snapshot(&drifted, "spy", &SnapshotOverrides::default()),
            Err(GexError::Schema { .. })
        ));
    }

    #[test]
    fn test_short_row_rejects_snapshot() {
        let short = format!("{EXPORT}Fri Aug 29 2025,C655,0.9,0,0.8,1.0,10,0.17,0.4,0.040,3000,655\n");
        assert!(matches!(
            parse_cboe_snapshot(&short, "spy", &SnapshotOverrides::default()),
            Err(GexError::Schema { .. })
        ));
    }

    #[test]
    fn test_asset_id_from_filename() {
        assert_eq!(asset_id_from_path(Path::new("data/raw/cboe_spx_quotedata_all_22-08-25.csv")), "spx");
        assert_eq!(
            asset_id_from_path(Path::new("processed_cboe_SPY_quotedata_all_22-08-25.json")),
            "spy"
        );
        assert_eq!(asset_id_from_path(Path::new("qqq.csv")), "qqq");
    }
}
