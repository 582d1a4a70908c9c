//! Explicit conversion records: restaurant-wide and per-ingredient
//!
//! Lookups are exact and direction-sensitive. A record for `A -> B` is never
//! used to answer `B -> A`. When several records share a key the first one
//! in insertion order wins.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{IngredientConversion, IngredientId, UniversalConversion};

#[derive(Debug, Clone, Default)]
pub struct ConversionTables {
    universal: Vec<UniversalConversion>,
    ingredient: Vec<IngredientConversion>,
}

/// A lookup key matched by more than one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbiguousRecord {
    pub ingredient_id: Option<IngredientId>,
    pub from_unit: String,
    pub to_unit: String,
    pub records: usize,
    pub winning_factor: Decimal,
}

impl ConversionTables {
    pub fn new(universal: Vec<UniversalConversion>, ingredient: Vec<IngredientConversion>) -> Self {
        Self { universal, ingredient }
    }

    pub fn add_universal(&mut self, conversion: UniversalConversion) {
        self.universal.push(conversion);
    }

    pub fn add_ingredient(&mut self, conversion: IngredientConversion) {
        self.ingredient.push(conversion);
    }

    pub fn universal(&self) -> &[UniversalConversion] {
        &self.universal
    }

    /// Records scoped to one ingredient, in insertion order
    pub fn for_ingredient(&self, ingredient_id: IngredientId) -> impl Iterator<Item = &IngredientConversion> {
        self.ingredient.iter().filter(move |c| c.ingredient_id == ingredient_id)
    }

    /// Factor for `from -> to`: ingredient-scoped when an id is given,
    /// otherwise restaurant-wide.
    pub fn find_factor(&self, from: &str, to: &str, ingredient_id: Option<IngredientId>) -> Option<Decimal> {
        match ingredient_id {
            Some(id) => self.ingredient_factor(id, from, to),
            None => self.universal_factor(from, to),
        }
    }

    pub fn ingredient_factor(&self, ingredient_id: IngredientId, from: &str, to: &str) -> Option<Decimal> {
        self.for_ingredient(ingredient_id)
            .find(|c| c.from_unit == from && c.to_unit == to)
            .map(|c| c.factor)
    }

    pub fn universal_factor(&self, from: &str, to: &str) -> Option<Decimal> {
        self.universal
            .iter()
            .find(|c| c.from_unit == from && c.to_unit == to)
            .map(|c| c.factor)
    }

    /// Keys that have duplicate records. Resolution still takes the first;
    /// this exists so admins can clean the data up.
    pub fn ambiguous_records(&self) -> Vec<AmbiguousRecord> {
        let mut seen: BTreeMap<(Option<IngredientId>, &str, &str), (usize, Decimal)> = BTreeMap::new();

        let keys = self
            .ingredient
            .iter()
            .map(|c| ((Some(c.ingredient_id), c.from_unit.as_str(), c.to_unit.as_str()), c.factor))
            .chain(
                self.universal
                    .iter()
                    .map(|c| ((None, c.from_unit.as_str(), c.to_unit.as_str()), c.factor)),
            );

        for (key, factor) in keys {
            seen.entry(key).or_insert((0, factor)).0 += 1;
        }

        seen.into_iter()
            .filter(|(_, (count, _))| *count > 1)
            .map(|((ingredient_id, from, to), (records, winning_factor))| AmbiguousRecord {
                ingredient_id,
                from_unit: from.to_string(),
                to_unit: to.to_string(),
                records,
                winning_factor,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universal(id: i64, from: &str, to: &str, factor: Decimal) -> UniversalConversion {
        UniversalConversion {
            id,
            from_unit: from.to_string(),
            to_unit: to.to_string(),
            factor,
        }
    }

    fn scoped(id: i64, ingredient_id: IngredientId, from: &str, to: &str, factor: Decimal) -> IngredientConversion {
        IngredientConversion {
            id,
            ingredient_id,
            from_unit: from.to_string(),
            to_unit: to.to_string(),
            factor,
        }
    }

    #[test]
    fn lookup_is_direction_sensitive() {
        let tables = ConversionTables::new(vec![universal(1, "pieces", "oz", Decimal::new(6, 1))], vec![]);
        assert_eq!(tables.find_factor("pieces", "oz", None), Some(Decimal::new(6, 1)));
        assert_eq!(tables.find_factor("oz", "pieces", None), None);
    }

    #[test]
    fn ingredient_scope_does_not_leak() {
        let tables = ConversionTables::new(vec![], vec![scoped(1, 7, "case", "lb", Decimal::new(40, 0))]);
        assert_eq!(tables.find_factor("case", "lb", Some(7)), Some(Decimal::new(40, 0)));
        assert_eq!(tables.find_factor("case", "lb", Some(8)), None);
        assert_eq!(tables.find_factor("case", "lb", None), None);
    }

    #[test]
    fn first_record_wins_on_duplicates() {
        let tables = ConversionTables::new(
            vec![],
            vec![
                scoped(1, 3, "bunch", "oz", Decimal::new(4, 0)),
                scoped(2, 3, "bunch", "oz", Decimal::new(5, 0)),
            ],
        );
        assert_eq!(tables.ingredient_factor(3, "bunch", "oz"), Some(Decimal::new(4, 0)));
    }

    #[test]
    fn ambiguous_records_are_reported() {
        let tables = ConversionTables::new(
            vec![
                universal(1, "pieces", "oz", Decimal::new(6, 1)),
                universal(2, "pieces", "oz", Decimal::new(7, 1)),
                universal(3, "case", "ea", Decimal::new(24, 0)),
            ],
            vec![
                scoped(1, 3, "bunch", "oz", Decimal::new(4, 0)),
                scoped(2, 3, "bunch", "oz", Decimal::new(5, 0)),
                scoped(3, 4, "bunch", "oz", Decimal::new(5, 0)),
            ],
        );

        let ambiguous = tables.ambiguous_records();
        assert_eq!(ambiguous.len(), 2);
        assert_eq!(ambiguous[0].ingredient_id, None);
        assert_eq!(ambiguous[0].winning_factor, Decimal::new(6, 1));
        assert_eq!(ambiguous[1].ingredient_id, Some(3));
        assert_eq!(ambiguous[1].records, 2);
        assert_eq!(ambiguous[1].winning_factor, Decimal::new(4, 0));
    }
}
