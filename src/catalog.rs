//! Read-only snapshot of everything a costing request needs
//!
//! The resolver and calculator never reach for ambient state; callers load a
//! `Catalog` (from SQLite via [`crate::db::load_catalog`] or from fixtures)
//! and pass it in.

use std::collections::BTreeMap;

use crate::conversions::ConversionTables;
use crate::error::{CostingError, Result};
use crate::models::{
    Ingredient, IngredientConversion, IngredientId, Recipe, RecipeId, RecipeIngredientLine, Unit,
    UniversalConversion,
};
use crate::resolver::ConversionResolver;
use crate::units::UnitRegistry;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub units: UnitRegistry,
    pub conversions: ConversionTables,
    ingredients: BTreeMap<IngredientId, Ingredient>,
    recipes: BTreeMap<RecipeId, Recipe>,
    lines: Vec<RecipeIngredientLine>,
}

impl Catalog {
    pub fn new(units: UnitRegistry, conversions: ConversionTables) -> Self {
        Self {
            units,
            conversions,
            ..Self::default()
        }
    }

    pub fn add_ingredient(&mut self, ingredient: Ingredient) {
        self.ingredients.insert(ingredient.id, ingredient);
    }

    pub fn add_recipe(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.id, recipe);
    }

    pub fn add_line(&mut self, line: RecipeIngredientLine) {
        self.lines.push(line);
    }

    pub fn add_universal_conversion(&mut self, conversion: UniversalConversion) {
        self.conversions.add_universal(conversion);
    }

    pub fn add_ingredient_conversion(&mut self, conversion: IngredientConversion) {
        self.conversions.add_ingredient(conversion);
    }

    pub fn resolver(&self) -> ConversionResolver<'_> {
        ConversionResolver::new(&self.units, &self.conversions)
    }

    pub fn ingredient(&self, id: IngredientId) -> Result<&Ingredient> {
        self.ingredients.get(&id).ok_or(CostingError::IngredientNotFound(id))
    }

    pub fn ingredients(&self) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.values()
    }

    pub fn ingredient_conversions(&self, id: IngredientId) -> Vec<&IngredientConversion> {
        self.conversions.for_ingredient(id).collect()
    }

    pub fn universal_conversions(&self) -> &[UniversalConversion] {
        self.conversions.universal()
    }

    pub fn unit(&self, code: &str) -> Result<&Unit> {
        self.units
            .lookup(code)
            .ok_or_else(|| CostingError::UnitNotFound(code.to_string()))
    }

    pub fn recipe(&self, id: RecipeId) -> Result<&Recipe> {
        self.recipes.get(&id).ok_or(CostingError::RecipeNotFound(id))
    }

    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    /// Lines of a recipe in the order they were added
    pub fn recipe_lines(&self, id: RecipeId) -> impl Iterator<Item = &RecipeIngredientLine> {
        self.lines.iter().filter(move |l| l.recipe_id == id)
    }
}
