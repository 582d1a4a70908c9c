//! Error types for the costing engine
//!
//! A missing conversion path is not an error: it is reported through
//! [`crate::resolver::Resolution::Failed`]. Everything here is a broken
//! contract or a store-level failure.

use thiserror::Error;

use crate::models::IngredientId;

#[derive(Debug, Error)]
pub enum CostingError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("ingredient {0} not found")]
    IngredientNotFound(IngredientId),

    #[error("recipe {0} not found")]
    RecipeNotFound(i64),

    #[error("unit '{0}' not found")]
    UnitNotFound(String),

    #[error("invalid unit '{code}': {reason}")]
    InvalidUnit { code: String, reason: String },

    #[error("unit '{code}' is still referenced by {references} ingredient(s) or recipe line(s)")]
    UnitInUse { code: String, references: i64 },

    #[error("arithmetic overflow while {0}")]
    Overflow(&'static str),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, CostingError>;
