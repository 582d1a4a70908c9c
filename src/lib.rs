//! Recipe costing engine
//!
//! Converts recipe quantities into each ingredient's storage unit and prices
//! them. Conversions are tried from most to least specific: ingredient
//! records, piece weight, standard unit ratios, then restaurant-wide records.

pub mod catalog;
pub mod conversions;
pub mod costing;
pub mod db;
pub mod error;
pub mod logging;
pub mod measure;
pub mod models;
pub mod resolver;
pub mod sample;
pub mod units;

pub use catalog::Catalog;
pub use costing::{IngredientCost, LineCost, RecipeCost, calculate_ingredient_cost, calculate_recipe_cost};
pub use error::{CostingError, Result};
pub use resolver::{ConversionPath, NoConversionPath, Resolution, resolve_conversion};
