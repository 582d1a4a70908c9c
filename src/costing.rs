//! Recipe cost calculator
//!
//! Each ingredient line is converted into the ingredient's storage unit and
//! priced at the ingredient's cost per storage unit. A line with no
//! conversion path is still priced, naively, as if the units were equal, and
//! carries a warning so callers can tell estimates from verified costs.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::catalog::Catalog;
use crate::error::{CostingError, Result};
use crate::models::{Ingredient, IngredientId, RecipeId};
use crate::resolver::{ConversionPath, Resolution};

/// Cost of a quantity of one ingredient
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientCost {
    pub ingredient_id: IngredientId,
    pub cost: Decimal,
    /// A real conversion between two different units was used
    pub conversion_applied: bool,
    pub path: Option<ConversionPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl IngredientCost {
    pub fn is_estimate(&self) -> bool {
        self.warning.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCost {
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub line_cost: Decimal,
    pub conversion_applied: bool,
    pub conversion_warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Derived recipe metrics. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCost {
    pub recipe_id: RecipeId,
    pub name: String,
    pub selling_price: Decimal,
    pub total_cost: Decimal,
    /// `None` when the selling price is not positive
    pub food_cost_percent: Option<Decimal>,
    pub margin_percent: Option<Decimal>,
    pub lines: Vec<LineCost>,
}

impl RecipeCost {
    pub fn estimated_lines(&self) -> usize {
        self.lines.iter().filter(|l| l.conversion_warning).count()
    }
}

/// Price `quantity` `unit` of an ingredient. Only an unknown ingredient, a
/// blank unit, or a cost too large to represent is an error.
pub fn calculate_ingredient_cost(
    catalog: &Catalog,
    ingredient_id: IngredientId,
    quantity: Decimal,
    unit: &str,
) -> Result<IngredientCost> {
    let ingredient = catalog.ingredient(ingredient_id)?;
    cost_of(catalog, ingredient, quantity, unit)
}

fn cost_of(catalog: &Catalog, ingredient: &Ingredient, quantity: Decimal, unit: &str) -> Result<IngredientCost> {
    let resolution = catalog
        .resolver()
        .resolve(quantity, unit, &ingredient.storage_unit, Some(ingredient))?;

    let price = |amount: Decimal| {
        amount
            .checked_mul(ingredient.cost_per_storage_unit)
            .ok_or(CostingError::Overflow("pricing an ingredient"))
    };

    Ok(match resolution {
        Resolution::Converted { value, path } => IngredientCost {
            ingredient_id: ingredient.id,
            cost: price(value)?,
            conversion_applied: unit != ingredient.storage_unit,
            path: Some(path),
            warning: None,
        },
        Resolution::Failed(failure) => {
            warn!(
                ingredient_id = ingredient.id,
                ingredient = %ingredient.name,
                from = %failure.from_unit,
                to = %failure.to_unit,
                "no conversion path, estimating cost as if units were equal"
            );
            IngredientCost {
                ingredient_id: ingredient.id,
                cost: price(quantity)?,
                conversion_applied: false,
                path: None,
                warning: Some(format!(
                    "No conversion from {} to {} for {}; cost estimated as if the units were equal",
                    failure.from_unit, failure.to_unit, ingredient.name
                )),
            }
        }
    })
}

/// Cost every line of a recipe and derive food cost and margin percentages
pub fn calculate_recipe_cost(catalog: &Catalog, recipe_id: RecipeId) -> Result<RecipeCost> {
    let recipe = catalog.recipe(recipe_id)?;

    let mut lines = Vec::new();
    for line in catalog.recipe_lines(recipe_id) {
        let ingredient = catalog.ingredient(line.ingredient_id)?;
        let cost = cost_of(catalog, ingredient, line.quantity, &line.unit)?;

        lines.push(LineCost {
            ingredient_id: ingredient.id,
            ingredient_name: ingredient.name.clone(),
            quantity: line.quantity,
            unit: line.unit.clone(),
            line_cost: cost.cost,
            conversion_applied: cost.conversion_applied,
            conversion_warning: cost.is_estimate(),
            warning: cost.warning,
        });
    }

    let total_cost = lines
        .iter()
        .try_fold(Decimal::ZERO, |total, l| total.checked_add(l.line_cost))
        .ok_or(CostingError::Overflow("totalling recipe cost"))?;
    let margin = recipe
        .selling_price
        .checked_sub(total_cost)
        .ok_or(CostingError::Overflow("computing margin"))?;
    let food_cost_percent = percent_of(total_cost, recipe.selling_price);
    let margin_percent = percent_of(margin, recipe.selling_price);

    Ok(RecipeCost {
        recipe_id,
        name: recipe.name.clone(),
        selling_price: recipe.selling_price,
        total_cost,
        food_cost_percent,
        margin_percent,
        lines,
    })
}

/// Cost every recipe in the catalog, ordered by recipe id
pub fn summarize_menu(catalog: &Catalog) -> Result<Vec<RecipeCost>> {
    catalog
        .recipes()
        .map(|recipe| calculate_recipe_cost(catalog, recipe.id))
        .collect()
}

fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole <= Decimal::ZERO {
        return None;
    }
    part.checked_div(whole)?.checked_mul(Decimal::ONE_HUNDRED)
}

fn format_percent(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{}%", v.round_dp(1)),
        None => "n/a".to_string(),
    }
}

impl fmt::Display for RecipeCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.name)?;
        writeln!(f)?;

        for line in &self.lines {
            let marker = if line.conversion_warning { " (!)" } else { "" };
            writeln!(
                f,
                "  {:<24} {:>8} {:<8} ${:>8}{}",
                line.ingredient_name,
                line.quantity.normalize(),
                line.unit,
                line.line_cost.round_dp(2),
                marker
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Total cost:    ${}", self.total_cost.round_dp(2))?;
        writeln!(f, "Selling price: ${}", self.selling_price.round_dp(2))?;
        writeln!(f, "Food cost:     {}", format_percent(self.food_cost_percent))?;
        writeln!(f, "Margin:        {}", format_percent(self.margin_percent))?;

        let estimated = self.estimated_lines();
        if estimated > 0 {
            writeln!(f)?;
            writeln!(f, "(!) {} line(s) estimated without a unit conversion", estimated)?;
            for line in self.lines.iter().filter_map(|l| l.warning.as_deref()) {
                writeln!(f, "    {}", line)?;
            }
        }

        Ok(())
    }
}
