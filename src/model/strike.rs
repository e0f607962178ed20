use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Serialize, Serializer};

use crate::error::{GexError, Result};

/// A strike in canonical fixed-point form.
///
/// Every key carries exactly `scale` decimal places, so `650`, `650.0` and
/// `650.000` collapse to the same bucket. A strike with significant digits
/// beyond the scale is rejected rather than silently rounded into a
/// neighbour's bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StrikeKey(Decimal);

impl StrikeKey {
    pub fn new(raw: Decimal, scale: u32) -> Result<Self> {
        let mut canonical = raw.normalize();
        if canonical.scale() > scale {
            return Err(GexError::StrikePrecision { raw, scale });
        }
        canonical.rescale(scale);
        Ok(StrikeKey(canonical))
    }

    /// Parse a textual strike (e.g. a JSON object key) into canonical form.
    pub fn parse(text: &str, scale: u32) -> Result<Self> {
        let raw = Decimal::from_str(text.trim()).map_err(|_| GexError::parse("strike", text))?;
        Self::new(raw, scale)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}

impl fmt::Display for StrikeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for StrikeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_textual_precision_shares_a_bucket() {
        let a = StrikeKey::parse("650", 2).unwrap();
        let b = StrikeKey::parse("650.0", 2).unwrap();
        let c = StrikeKey::parse(" 650.000 ", 2).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.to_string(), "650.00");

        let mut buckets = BTreeMap::new();
        for key in [a, b, c] {
            *buckets.entry(key).or_insert(0) += 1;
        }
        assert_eq!(buckets.len(), 1);
    }

    #[test]
    fn test_excess_precision_is_rejected() {
        let err = StrikeKey::parse("650.125", 2).unwrap_err();
        assert!(matches!(err, GexError::StrikePrecision { scale: 2, .. }));
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        assert!(matches!(
            StrikeKey::parse("six fifty", 2),
            Err(GexError::Parse { field: "strike", .. })
        ));
    }

    #[test]
    fn test_orders_numerically() {
        let low = StrikeKey::parse("95", 2).unwrap();
        let high = StrikeKey::parse("100.5", 2).unwrap();
        assert!(low < high);
        assert_eq!(high.to_string(), "100.50");
    }
}
