//! Sample kitchen data for trying the calculator without a real back office

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::db;
use crate::models::RecipeIngredientLine;
use crate::units::standard_units;

/// Replace the database contents with standard units and a small menu
pub fn load_sample_data(conn: &Connection) -> Result<()> {
    db::clear_data(conn)?;

    for unit in standard_units() {
        db::upsert_unit(conn, &unit)?;
    }

    // Scallops are bought by the pound and plated by the piece
    let scallops = db::insert_ingredient(conn, "Scallops", "lb", Decimal::new(1920, 2), Some(Decimal::new(15, 1)))?;
    let cream = db::insert_ingredient(conn, "Heavy cream", "qt", Decimal::new(450, 2), None)?;
    let butter = db::insert_ingredient(conn, "Butter", "lb", Decimal::new(499, 2), None)?;
    let shrimp = db::insert_ingredient(conn, "Shrimp", "oz", Decimal::new(85, 2), None)?;
    let parsley = db::insert_ingredient(conn, "Parsley", "oz", Decimal::new(75, 2), None)?;
    let lemons = db::insert_ingredient(conn, "Lemons", "ea", Decimal::new(40, 2), None)?;
    let thyme = db::insert_ingredient(conn, "Thyme", "bunch", Decimal::new(150, 2), None)?;

    db::insert_ingredient_conversion(conn, parsley, "bunch", "oz", Decimal::new(4, 0))?;
    db::insert_universal_conversion(conn, "pieces", "oz", Decimal::new(6, 1))?;

    let seared = db::insert_recipe(conn, "Seared scallops", Decimal::new(28, 0))?;
    let cocktail = db::insert_recipe(conn, "Shrimp cocktail", Decimal::new(16, 0))?;
    let sauce = db::insert_recipe(conn, "Herb cream sauce", Decimal::ZERO)?;

    let lines = [
        (seared, scallops, Decimal::new(4, 0), "pc"),
        (seared, butter, Decimal::new(2, 0), "tbsp"),
        (seared, parsley, Decimal::new(25, 2), "bunch"),
        (seared, lemons, Decimal::new(5, 1), "ea"),
        (cocktail, shrimp, Decimal::new(6, 0), "pieces"),
        (cocktail, lemons, Decimal::ONE, "ea"),
        (sauce, cream, Decimal::ONE, "cup"),
        (sauce, thyme, Decimal::new(2, 0), "g"),
    ];

    for (recipe_id, ingredient_id, quantity, unit) in lines {
        db::insert_recipe_line(
            conn,
            &RecipeIngredientLine {
                recipe_id,
                ingredient_id,
                quantity,
                unit: unit.to_string(),
            },
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::{calculate_recipe_cost, summarize_menu};

    #[test]
    fn sample_menu_costs() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        load_sample_data(&conn).unwrap();
        let catalog = db::load_catalog(&conn).unwrap();

        let menu = summarize_menu(&catalog).unwrap();
        assert_eq!(menu.len(), 3);

        // 6 pieces of shrimp via the universal table = 3.6 oz
        let cocktail = calculate_recipe_cost(&catalog, 2).unwrap();
        assert_eq!(cocktail.lines[0].line_cost, Decimal::new(306, 2));
        assert!(!cocktail.lines[0].conversion_warning);

        // butter by the tablespoon has no weight conversion and is estimated
        let seared = calculate_recipe_cost(&catalog, 1).unwrap();
        assert_eq!(seared.lines[0].line_cost, Decimal::new(720, 2));
        assert!(seared.lines[1].conversion_warning);
        assert_eq!(seared.lines[2].line_cost, Decimal::new(75, 2));

        let sauce = calculate_recipe_cost(&catalog, 3).unwrap();
        assert_eq!(sauce.food_cost_percent, None);
        assert!(sauce.lines[1].conversion_warning);
    }

    #[test]
    fn reloading_replaces_previous_data() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        load_sample_data(&conn).unwrap();
        load_sample_data(&conn).unwrap();

        let catalog = db::load_catalog(&conn).unwrap();
        let ids: Vec<_> = catalog.recipes().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(catalog.universal_conversions().len(), 1);
    }
}
