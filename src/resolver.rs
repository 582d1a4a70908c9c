//! Conversion resolver
//!
//! Picks the most specific conversion available for a quantity, in order:
//!
//! 1. identity (same code)
//! 2. ingredient-specific record
//! 3. piece weight (piece-like unit <-> weight unit, via ounces)
//! 4. unit registry ratio within one standard dimension
//! 5. restaurant-wide record
//!
//! Running out of options yields [`Resolution::Failed`], not an error.

use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::catalog::Catalog;
use crate::conversions::ConversionTables;
use crate::error::{CostingError, Result};
use crate::models::{Dimension, Ingredient, IngredientId};
use crate::units::{PIECE_WEIGHT_UNIT, UnitRegistry, is_piece_unit};

/// Which tier produced a converted quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionPath {
    Identity,
    IngredientSpecific,
    PieceWeight,
    UnitRegistry,
    Universal,
}

impl ConversionPath {
    pub fn describe(self) -> &'static str {
        match self {
            ConversionPath::Identity => "same unit",
            ConversionPath::IngredientSpecific => "ingredient conversion",
            ConversionPath::PieceWeight => "piece weight",
            ConversionPath::UnitRegistry => "standard units",
            ConversionPath::Universal => "universal conversion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoConversionPath {
    pub from_unit: String,
    pub to_unit: String,
    pub ingredient_id: Option<IngredientId>,
}

impl Serialize for NoConversionPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("NoConversionPath", 4)?;
        state.serialize_field("failed", &true)?;
        state.serialize_field("fromUnit", &self.from_unit)?;
        state.serialize_field("toUnit", &self.to_unit)?;
        state.serialize_field("ingredientId", &self.ingredient_id)?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolution {
    Converted { value: Decimal, path: ConversionPath },
    Failed(NoConversionPath),
}

impl Resolution {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Resolution::Converted { value, .. } => Some(*value),
            Resolution::Failed(_) => None,
        }
    }

    pub fn path(&self) -> Option<ConversionPath> {
        match self {
            Resolution::Converted { path, .. } => Some(*path),
            Resolution::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Resolution::Failed(_))
    }
}

pub struct ConversionResolver<'a> {
    units: &'a UnitRegistry,
    tables: &'a ConversionTables,
}

impl<'a> ConversionResolver<'a> {
    pub fn new(units: &'a UnitRegistry, tables: &'a ConversionTables) -> Self {
        Self { units, tables }
    }

    /// Convert `quantity` from one unit code to another, optionally in the
    /// context of one ingredient. Only blank unit codes are errors.
    pub fn resolve(
        &self,
        quantity: Decimal,
        from: &str,
        to: &str,
        ingredient: Option<&Ingredient>,
    ) -> Result<Resolution> {
        if from.trim().is_empty() {
            return Err(CostingError::MissingField("from unit"));
        }
        if to.trim().is_empty() {
            return Err(CostingError::MissingField("to unit"));
        }

        let converted = self.first_applicable(quantity, from, to, ingredient);
        let ingredient_id = ingredient.map(|i| i.id);

        Ok(match converted {
            Some((value, path)) => {
                debug!(from, to, ?ingredient_id, ?path, %quantity, %value, "resolved conversion");
                Resolution::Converted { value, path }
            }
            None => {
                debug!(from, to, ?ingredient_id, "no conversion path");
                Resolution::Failed(NoConversionPath {
                    from_unit: from.to_string(),
                    to_unit: to.to_string(),
                    ingredient_id,
                })
            }
        })
    }

    fn first_applicable(
        &self,
        quantity: Decimal,
        from: &str,
        to: &str,
        ingredient: Option<&Ingredient>,
    ) -> Option<(Decimal, ConversionPath)> {
        if from == to {
            return Some((quantity, ConversionPath::Identity));
        }

        if let Some(ingredient) = ingredient {
            if let Some(value) = self
                .tables
                .ingredient_factor(ingredient.id, from, to)
                .and_then(|factor| quantity.checked_mul(factor))
            {
                return Some((value, ConversionPath::IngredientSpecific));
            }

            if let Some(value) = self.via_piece_weight(quantity, from, to, ingredient) {
                return Some((value, ConversionPath::PieceWeight));
            }
        }

        if let Some(value) = self.units.auto_convert(quantity, from, to) {
            return Some((value, ConversionPath::UnitRegistry));
        }

        self.tables
            .universal_factor(from, to)
            .and_then(|factor| quantity.checked_mul(factor))
            .map(|value| (value, ConversionPath::Universal))
    }

    /// Bridge piece counts and weights through the ingredient's ounces per piece
    fn via_piece_weight(&self, quantity: Decimal, from: &str, to: &str, ingredient: &Ingredient) -> Option<Decimal> {
        let piece_weight = ingredient.piece_weight_oz.filter(|w| *w > Decimal::ZERO)?;
        let is_weight = |code: &str| self.units.dimension_of(code) == Some(Dimension::Weight);

        if is_piece_unit(from) && is_weight(to) {
            let ounces = quantity.checked_mul(piece_weight)?;
            if to == PIECE_WEIGHT_UNIT {
                return Some(ounces);
            }
            self.units.auto_convert(ounces, PIECE_WEIGHT_UNIT, to)
        } else if is_weight(from) && is_piece_unit(to) {
            let ounces = if from == PIECE_WEIGHT_UNIT {
                quantity
            } else {
                self.units.auto_convert(quantity, from, PIECE_WEIGHT_UNIT)?
            };
            ounces.checked_div(piece_weight)
        } else {
            None
        }
    }
}

/// Resolve a conversion against a catalog, looking the ingredient up by id.
/// An unknown ingredient id is a caller error.
pub fn resolve_conversion(
    catalog: &Catalog,
    quantity: Decimal,
    from: &str,
    to: &str,
    ingredient_id: Option<IngredientId>,
) -> Result<Resolution> {
    let ingredient = ingredient_id.map(|id| catalog.ingredient(id)).transpose()?;
    catalog.resolver().resolve(quantity, from, to, ingredient)
}
