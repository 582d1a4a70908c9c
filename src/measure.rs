//! Parsing of typed measures such as "2 pc", "1.5lb" or "3 fl oz"

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{CostingError, Result};

static MEASURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(-?(?:\d+(?:\.\d+)?|\.\d+))\s*(.*?)\s*$").expect("valid measure regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub quantity: Decimal,
    pub unit: String,
}

impl FromStr for Measure {
    type Err = CostingError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = MEASURE_RE.captures(s).ok_or(CostingError::MissingField("quantity"))?;
        let quantity = Decimal::from_str(&caps[1]).map_err(|_| CostingError::MissingField("quantity"))?;
        if caps[2].is_empty() {
            return Err(CostingError::MissingField("unit"));
        }

        // Collapse inner whitespace so "fl   oz" matches the "fl oz" code
        let unit = caps[2].split_whitespace().collect::<Vec<_>>().join(" ");

        Ok(Measure { quantity, unit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Measure {
        s.parse().unwrap()
    }

    #[test]
    fn parses_quantity_and_unit() {
        assert_eq!(parse("2 pc"), Measure { quantity: Decimal::new(2, 0), unit: "pc".to_string() });
        assert_eq!(parse("1.5lb").quantity, Decimal::new(15, 1));
        assert_eq!(parse("1.5lb").unit, "lb");
        assert_eq!(parse(" .25  cup ").quantity, Decimal::new(25, 2));
        assert_eq!(parse("3 fl   oz").unit, "fl oz");
    }

    #[test]
    fn unit_case_is_preserved() {
        assert_eq!(parse("4 Pieces").unit, "Pieces");
    }

    #[test]
    fn rejects_incomplete_measures() {
        assert!(matches!("".parse::<Measure>(), Err(CostingError::MissingField("quantity"))));
        assert!(matches!("12".parse::<Measure>(), Err(CostingError::MissingField("unit"))));
        assert!(matches!("lb".parse::<Measure>(), Err(CostingError::MissingField("quantity"))));
    }
}
