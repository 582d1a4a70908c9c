//! Unit registry: dimensions and factors to each dimension's base unit

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{Dimension, Unit};

/// Count-like codes that can bridge to weight through an ingredient's piece weight
pub const PIECE_UNITS: &[&str] = &["pc", "piece", "pieces"];

/// Unit the piece weight is denominated in
pub const PIECE_WEIGHT_UNIT: &str = "oz";

pub fn is_piece_unit(code: &str) -> bool {
    PIECE_UNITS.contains(&code)
}

/// Read-only catalog of known units, keyed by exact code
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    units: BTreeMap<String, Unit>,
}

impl UnitRegistry {
    /// Build a registry, rejecting units whose dimension and factor disagree.
    /// A later unit with the same code replaces an earlier one.
    pub fn new(units: impl IntoIterator<Item = Unit>) -> Result<Self> {
        let mut registry = Self::default();
        for unit in units {
            registry.insert(unit)?;
        }
        Ok(registry)
    }

    pub fn standard() -> Self {
        Self {
            units: standard_units().into_iter().map(|u| (u.code.clone(), u)).collect(),
        }
    }

    pub fn insert(&mut self, unit: Unit) -> Result<()> {
        unit.validate()?;
        self.units.insert(unit.code.clone(), unit);
        Ok(())
    }

    pub fn lookup(&self, code: &str) -> Option<&Unit> {
        self.units.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.units.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn dimension_of(&self, code: &str) -> Option<Dimension> {
        self.lookup(code).map(|u| u.dimension)
    }

    /// Both units are known and share a dimension. Unknown units are never
    /// in the same dimension as anything.
    pub fn same_dimension(&self, a: &str, b: &str) -> bool {
        match (self.dimension_of(a), self.dimension_of(b)) {
            (Some(da), Some(db)) => da == db,
            _ => false,
        }
    }

    /// Ratio conversion inside one standard dimension.
    ///
    /// Returns `None` when either unit is unknown, the dimensions differ, the
    /// dimension is `Custom`, or the arithmetic overflows.
    pub fn auto_convert(&self, quantity: Decimal, from: &str, to: &str) -> Option<Decimal> {
        let from_unit = self.lookup(from)?;
        let to_unit = self.lookup(to)?;

        if from_unit.dimension != to_unit.dimension || from_unit.dimension == Dimension::Custom {
            return None;
        }

        let from_factor = from_unit.factor_to_base?;
        let to_factor = to_unit.factor_to_base?;
        if to_factor.is_zero() {
            return None;
        }

        quantity.checked_mul(from_factor)?.checked_div(to_factor)
    }
}

/// Units every kitchen starts with. Base units: gram, millilitre, each.
pub fn standard_units() -> Vec<Unit> {
    use Dimension::*;

    let std_unit = |code: &str, name: &str, dim: Dimension, factor: Decimal| {
        Unit::new(code, name, dim, Some(factor))
    };

    vec![
        std_unit("mg", "Milligram", Weight, Decimal::new(1, 3)),
        std_unit("g", "Gram", Weight, Decimal::ONE),
        std_unit("kg", "Kilogram", Weight, Decimal::new(1000, 0)),
        std_unit("oz", "Ounce", Weight, Decimal::new(28_349_523_125, 9)),
        std_unit("lb", "Pound", Weight, Decimal::new(45_359_237, 5)),
        std_unit("ml", "Millilitre", Volume, Decimal::ONE),
        std_unit("l", "Litre", Volume, Decimal::new(1000, 0)),
        std_unit("tsp", "Teaspoon", Volume, Decimal::new(492_892_159_375, 11)),
        std_unit("tbsp", "Tablespoon", Volume, Decimal::new(1_478_676_478_125, 11)),
        std_unit("fl oz", "Fluid ounce", Volume, Decimal::new(295_735_295_625, 10)),
        std_unit("cup", "Cup", Volume, Decimal::new(2_365_882_365, 7)),
        std_unit("pt", "Pint", Volume, Decimal::new(473_176_473, 6)),
        std_unit("qt", "Quart", Volume, Decimal::new(946_352_946, 6)),
        std_unit("gal", "Gallon", Volume, Decimal::new(3_785_411_784, 6)),
        std_unit("ea", "Each", Count, Decimal::ONE),
        std_unit("each", "Each", Count, Decimal::ONE),
        std_unit("pc", "Piece", Count, Decimal::ONE),
        std_unit("piece", "Piece", Count, Decimal::ONE),
        std_unit("pieces", "Pieces", Count, Decimal::ONE),
        std_unit("dozen", "Dozen", Count, Decimal::new(12, 0)),
        Unit::new("case", "Case", Custom, None),
        Unit::new("bunch", "Bunch", Custom, None),
        Unit::new("bag", "Bag", Custom, None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CostingError;

    fn tolerance() -> Decimal {
        Decimal::new(1, 9)
    }

    #[test]
    fn lookup_finds_known_units_only() {
        let registry = UnitRegistry::standard();
        assert_eq!(registry.lookup("lb").map(|u| u.dimension), Some(Dimension::Weight));
        assert!(registry.lookup("LB").is_none());
        assert!(registry.lookup("furlong").is_none());
    }

    #[test]
    fn same_dimension_requires_both_units() {
        let registry = UnitRegistry::standard();
        assert!(registry.same_dimension("oz", "kg"));
        assert!(registry.same_dimension("case", "bag"));
        assert!(!registry.same_dimension("oz", "cup"));
        assert!(!registry.same_dimension("oz", "stone"));
    }

    #[test]
    fn auto_convert_within_weight() {
        let registry = UnitRegistry::standard();
        assert_eq!(registry.auto_convert(Decimal::new(16, 0), "oz", "lb"), Some(Decimal::ONE));
        assert_eq!(
            registry.auto_convert(Decimal::new(2, 0), "kg", "g"),
            Some(Decimal::new(2000, 0))
        );
        assert_eq!(
            registry.auto_convert(Decimal::new(3, 0), "dozen", "ea"),
            Some(Decimal::new(36, 0))
        );
    }

    #[test]
    fn auto_convert_round_trips_weight_units() {
        let registry = UnitRegistry::standard();
        let weights: Vec<&str> = registry
            .iter()
            .filter(|u| u.dimension == Dimension::Weight)
            .map(|u| u.code.as_str())
            .collect();
        let quantity = Decimal::new(1234, 2);

        for a in &weights {
            for b in &weights {
                let there = registry.auto_convert(quantity, a, b).unwrap();
                let back = registry.auto_convert(there, b, a).unwrap();
                assert!((back - quantity).abs() < tolerance(), "{} -> {} -> {}: {}", a, b, a, back);
            }
        }
    }

    #[test]
    fn auto_convert_refuses_cross_dimension_and_custom() {
        let registry = UnitRegistry::standard();
        assert_eq!(registry.auto_convert(Decimal::ONE, "gal", "pc"), None);
        assert_eq!(registry.auto_convert(Decimal::ONE, "case", "bag"), None);
        assert_eq!(registry.auto_convert(Decimal::ONE, "case", "case"), None);
        assert_eq!(registry.auto_convert(Decimal::ONE, "oz", "stone"), None);
    }

    #[test]
    fn registry_rejects_inconsistent_units() {
        let custom_with_factor = Unit::new("crate", "Crate", Dimension::Custom, Some(Decimal::ONE));
        assert!(matches!(
            UnitRegistry::new(vec![custom_with_factor]),
            Err(CostingError::InvalidUnit { .. })
        ));

        let weight_without_factor = Unit::new("stone", "Stone", Dimension::Weight, None);
        assert!(UnitRegistry::new(vec![weight_without_factor]).is_err());

        let zero_factor = Unit::new("nil", "Nil", Dimension::Volume, Some(Decimal::ZERO));
        assert!(UnitRegistry::new(vec![zero_factor]).is_err());
    }

    #[test]
    fn piece_units_are_recognized() {
        assert!(is_piece_unit("pc"));
        assert!(is_piece_unit("pieces"));
        assert!(!is_piece_unit("ea"));
        assert!(!is_piece_unit("PC"));
    }
}
