//! Data models for units, ingredients, conversions and recipes

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CostingError;

pub type IngredientId = i64;
pub type RecipeId = i64;

/// Unit family. Units in the same family convert by simple ratio,
/// except `Custom` which only converts through explicit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Weight,
    Volume,
    Count,
    Custom,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Weight => "weight",
            Dimension::Volume => "volume",
            Dimension::Count => "count",
            Dimension::Custom => "custom",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weight" => Ok(Dimension::Weight),
            "volume" => Ok(Dimension::Volume),
            "count" => Ok(Dimension::Count),
            "custom" => Ok(Dimension::Custom),
            other => Err(format!("unknown dimension '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub code: String,
    pub display_name: String,
    pub dimension: Dimension,
    /// How many base units of the dimension one of this unit is worth.
    /// Always `None` for `Custom` units.
    pub factor_to_base: Option<Decimal>,
}

impl Unit {
    pub fn new(code: &str, display_name: &str, dimension: Dimension, factor_to_base: Option<Decimal>) -> Self {
        Self {
            code: code.to_string(),
            display_name: display_name.to_string(),
            dimension,
            factor_to_base,
        }
    }

    /// Check the dimension/factor pairing before the unit enters a registry or store
    pub fn validate(&self) -> Result<(), CostingError> {
        let invalid = |reason: &str| CostingError::InvalidUnit {
            code: self.code.clone(),
            reason: reason.to_string(),
        };

        if self.code.trim().is_empty() {
            return Err(CostingError::MissingField("unit code"));
        }

        match (self.dimension, self.factor_to_base) {
            (Dimension::Custom, Some(_)) => Err(invalid("custom units cannot have a factor to base")),
            (Dimension::Custom, None) => Ok(()),
            (_, None) => Err(invalid("standard units need a factor to base")),
            (_, Some(factor)) if factor <= Decimal::ZERO => Err(invalid("factor to base must be positive")),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub storage_unit: String,
    /// Denominated in `storage_unit`
    pub cost_per_storage_unit: Decimal,
    pub piece_weight_oz: Option<Decimal>,
}

/// `1 from_unit = factor to_unit` for one ingredient only. Directional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientConversion {
    pub id: i64,
    pub ingredient_id: IngredientId,
    pub from_unit: String,
    pub to_unit: String,
    pub factor: Decimal,
}

/// Restaurant-wide `1 from_unit = factor to_unit`. Directional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversalConversion {
    pub id: i64,
    pub from_unit: String,
    pub to_unit: String,
    pub factor: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub selling_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredientLine {
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub quantity: Decimal,
    pub unit: String,
}
