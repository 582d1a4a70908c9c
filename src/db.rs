//! Database schema and operations

use std::str::FromStr;

use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::info;

use crate::catalog::Catalog;
use crate::conversions::ConversionTables;
use crate::error::CostingError;
use crate::models::{
    Dimension, Ingredient, IngredientConversion, IngredientId, Recipe, RecipeId, RecipeIngredientLine,
    Unit, UniversalConversion,
};
use crate::units::UnitRegistry;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Decimal values are stored as TEXT to keep them exact

        CREATE TABLE IF NOT EXISTS units (
            code TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            dimension TEXT NOT NULL,
            factor_to_base TEXT
        );

        CREATE TABLE IF NOT EXISTS ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            storage_unit TEXT NOT NULL,
            cost_per_storage_unit TEXT NOT NULL,
            piece_weight_oz TEXT
        );

        -- No uniqueness on (ingredient_id, from_unit, to_unit): the lowest id wins
        CREATE TABLE IF NOT EXISTS ingredient_conversions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ingredient_id INTEGER NOT NULL,
            from_unit TEXT NOT NULL,
            to_unit TEXT NOT NULL,
            factor TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS universal_conversions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            from_unit TEXT NOT NULL,
            to_unit TEXT NOT NULL,
            factor TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            selling_price TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL,
            ingredient_id INTEGER NOT NULL,
            quantity TEXT NOT NULL,
            unit TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ingredient_conversions_ingredient ON ingredient_conversions(ingredient_id);
        CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);
        CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_unit ON recipe_ingredients(unit);
        CREATE INDEX IF NOT EXISTS idx_ingredients_storage_unit ON ingredients(storage_unit);
        "#,
    )?;
    Ok(())
}

fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        Decimal::from_str(&t).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn dimension_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Dimension> {
    let text: String = row.get(idx)?;
    Dimension::from_str(&text).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

/// Insert or replace a unit after checking its dimension/factor pairing
pub fn upsert_unit(conn: &Connection, unit: &Unit) -> Result<()> {
    unit.validate()?;
    conn.execute(
        "INSERT OR REPLACE INTO units (code, display_name, dimension, factor_to_base)
         VALUES (?1, ?2, ?3, ?4)",
        (
            &unit.code,
            &unit.display_name,
            unit.dimension.as_str(),
            unit.factor_to_base.map(|f| f.to_string()),
        ),
    )?;
    info!(code = %unit.code, dimension = %unit.dimension, "saved unit");
    Ok(())
}

/// Delete a unit. Fails with [`CostingError::UnitInUse`] while any ingredient
/// or recipe line still refers to it.
pub fn delete_unit(conn: &Connection, code: &str) -> Result<()> {
    // Reference check and delete must see the same snapshot
    let tx = conn.unchecked_transaction()?;

    let exists: Option<String> = tx
        .query_row("SELECT code FROM units WHERE code = ?1", [code], |row| row.get(0))
        .optional()?;
    if exists.is_none() {
        return Err(CostingError::UnitNotFound(code.to_string()).into());
    }

    let references: i64 = tx.query_row(
        "SELECT (SELECT COUNT(*) FROM ingredients WHERE storage_unit = ?1)
              + (SELECT COUNT(*) FROM recipe_ingredients WHERE unit = ?1)",
        [code],
        |row| row.get(0),
    )?;
    if references > 0 {
        return Err(CostingError::UnitInUse {
            code: code.to_string(),
            references,
        }
        .into());
    }

    tx.execute("DELETE FROM units WHERE code = ?1", [code])?;
    tx.commit()?;
    info!(code, "deleted unit");
    Ok(())
}

/// Insert an ingredient, returning its id
pub fn insert_ingredient(
    conn: &Connection,
    name: &str,
    storage_unit: &str,
    cost_per_storage_unit: Decimal,
    piece_weight_oz: Option<Decimal>,
) -> Result<IngredientId> {
    conn.execute(
        "INSERT INTO ingredients (name, storage_unit, cost_per_storage_unit, piece_weight_oz)
         VALUES (?1, ?2, ?3, ?4)",
        (
            name,
            storage_unit,
            cost_per_storage_unit.to_string(),
            piece_weight_oz.map(|w| w.to_string()),
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert an ingredient-specific conversion (`1 from = factor to`)
pub fn insert_ingredient_conversion(
    conn: &Connection,
    ingredient_id: IngredientId,
    from_unit: &str,
    to_unit: &str,
    factor: Decimal,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO ingredient_conversions (ingredient_id, from_unit, to_unit, factor)
         VALUES (?1, ?2, ?3, ?4)",
        (ingredient_id, from_unit, to_unit, factor.to_string()),
    )?;
    info!(ingredient_id, from_unit, to_unit, %factor, "saved ingredient conversion");
    Ok(conn.last_insert_rowid())
}

/// Insert a restaurant-wide conversion (`1 from = factor to`)
pub fn insert_universal_conversion(conn: &Connection, from_unit: &str, to_unit: &str, factor: Decimal) -> Result<i64> {
    conn.execute(
        "INSERT INTO universal_conversions (from_unit, to_unit, factor) VALUES (?1, ?2, ?3)",
        (from_unit, to_unit, factor.to_string()),
    )?;
    info!(from_unit, to_unit, %factor, "saved universal conversion");
    Ok(conn.last_insert_rowid())
}

/// Insert a recipe, returning its id
pub fn insert_recipe(conn: &Connection, name: &str, selling_price: Decimal) -> Result<RecipeId> {
    conn.execute(
        "INSERT INTO recipes (name, selling_price) VALUES (?1, ?2)",
        (name, selling_price.to_string()),
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert one ingredient line of a recipe
pub fn insert_recipe_line(conn: &Connection, line: &RecipeIngredientLine) -> Result<()> {
    conn.execute(
        "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, unit)
         VALUES (?1, ?2, ?3, ?4)",
        (line.recipe_id, line.ingredient_id, line.quantity.to_string(), &line.unit),
    )?;
    Ok(())
}

/// Clear all data and restart id sequences (for reloading samples)
pub fn clear_data(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_ingredients;
        DELETE FROM recipes;
        DELETE FROM universal_conversions;
        DELETE FROM ingredient_conversions;
        DELETE FROM ingredients;
        DELETE FROM units;
        DELETE FROM sqlite_sequence;
        "#,
    )?;
    Ok(())
}

/// List all units ordered by dimension then code
pub fn list_units(conn: &Connection) -> Result<Vec<Unit>> {
    let mut stmt = conn.prepare(
        "SELECT code, display_name, dimension, factor_to_base FROM units ORDER BY dimension, code",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Unit {
            code: row.get(0)?,
            display_name: row.get(1)?,
            dimension: dimension_at(row, 2)?,
            factor_to_base: optional_decimal_at(row, 3)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all ingredients ordered by id
pub fn list_ingredients(conn: &Connection) -> Result<Vec<Ingredient>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, storage_unit, cost_per_storage_unit, piece_weight_oz FROM ingredients ORDER BY id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Ingredient {
            id: row.get(0)?,
            name: row.get(1)?,
            storage_unit: row.get(2)?,
            cost_per_storage_unit: decimal_at(row, 3)?,
            piece_weight_oz: optional_decimal_at(row, 4)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn list_ingredient_conversions(conn: &Connection) -> Result<Vec<IngredientConversion>> {
    let mut stmt = conn.prepare(
        "SELECT id, ingredient_id, from_unit, to_unit, factor FROM ingredient_conversions ORDER BY id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(IngredientConversion {
            id: row.get(0)?,
            ingredient_id: row.get(1)?,
            from_unit: row.get(2)?,
            to_unit: row.get(3)?,
            factor: decimal_at(row, 4)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn list_universal_conversions(conn: &Connection) -> Result<Vec<UniversalConversion>> {
    let mut stmt = conn.prepare("SELECT id, from_unit, to_unit, factor FROM universal_conversions ORDER BY id")?;

    let rows = stmt.query_map([], |row| {
        Ok(UniversalConversion {
            id: row.get(0)?,
            from_unit: row.get(1)?,
            to_unit: row.get(2)?,
            factor: decimal_at(row, 3)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn list_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare("SELECT id, name, selling_price FROM recipes ORDER BY id")?;

    let rows = stmt.query_map([], |row| {
        Ok(Recipe {
            id: row.get(0)?,
            name: row.get(1)?,
            selling_price: decimal_at(row, 2)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn list_recipe_lines(conn: &Connection) -> Result<Vec<RecipeIngredientLine>> {
    let mut stmt = conn.prepare(
        "SELECT recipe_id, ingredient_id, quantity, unit FROM recipe_ingredients ORDER BY recipe_id, id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(RecipeIngredientLine {
            recipe_id: row.get(0)?,
            ingredient_id: row.get(1)?,
            quantity: decimal_at(row, 2)?,
            unit: row.get(3)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Read everything into an in-memory catalog for costing
pub fn load_catalog(conn: &Connection) -> Result<Catalog> {
    let units = UnitRegistry::new(list_units(conn)?)?;
    let conversions = ConversionTables::new(list_universal_conversions(conn)?, list_ingredient_conversions(conn)?);

    let mut catalog = Catalog::new(units, conversions);
    for ingredient in list_ingredients(conn)? {
        catalog.add_ingredient(ingredient);
    }
    for recipe in list_recipes(conn)? {
        catalog.add_recipe(recipe);
    }
    for line in list_recipe_lines(conn)? {
        catalog.add_line(line);
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::calculate_recipe_cost;
    use crate::resolver::resolve_conversion;
    use crate::units::standard_units;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        for unit in standard_units() {
            upsert_unit(&conn, &unit).unwrap();
        }
        conn
    }

    #[test]
    fn units_round_trip_through_the_store() {
        let conn = setup();
        let units = list_units(&conn).unwrap();
        assert_eq!(units.len(), standard_units().len());

        let oz = units.iter().find(|u| u.code == "oz").unwrap();
        assert_eq!(oz.dimension, Dimension::Weight);
        assert_eq!(oz.factor_to_base, Some(Decimal::new(28_349_523_125, 9)));

        let case = units.iter().find(|u| u.code == "case").unwrap();
        assert_eq!(case.factor_to_base, None);
    }

    #[test]
    fn invalid_units_are_rejected() {
        let conn = setup();
        let bad = Unit::new("crate", "Crate", Dimension::Custom, Some(Decimal::ONE));
        let err = upsert_unit(&conn, &bad).unwrap_err();
        assert!(matches!(err.downcast_ref::<CostingError>(), Some(CostingError::InvalidUnit { .. })));
    }

    #[test]
    fn referenced_units_cannot_be_deleted() {
        let conn = setup();
        insert_ingredient(&conn, "Butter", "lb", Decimal::new(499, 2), None).unwrap();
        let recipe = insert_recipe(&conn, "Toast", Decimal::new(4, 0)).unwrap();
        insert_recipe_line(
            &conn,
            &RecipeIngredientLine {
                recipe_id: recipe,
                ingredient_id: 1,
                quantity: Decimal::ONE,
                unit: "tbsp".to_string(),
            },
        )
        .unwrap();

        for code in ["lb", "tbsp"] {
            let err = delete_unit(&conn, code).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<CostingError>(),
                Some(CostingError::UnitInUse { references: 1, .. })
            ));
        }

        delete_unit(&conn, "gal").unwrap();
        assert!(list_units(&conn).unwrap().iter().all(|u| u.code != "gal"));

        let err = delete_unit(&conn, "gal").unwrap_err();
        assert!(matches!(err.downcast_ref::<CostingError>(), Some(CostingError::UnitNotFound(_))));
    }

    #[test]
    fn failed_delete_leaves_unit_and_connection_usable() {
        let conn = setup();
        insert_ingredient(&conn, "Milk", "gal", Decimal::new(399, 2), None).unwrap();

        assert!(delete_unit(&conn, "gal").is_err());
        assert!(conn.is_autocommit());
        assert!(list_units(&conn).unwrap().iter().any(|u| u.code == "gal"));

        // The rolled-back transaction does not block later writes
        delete_unit(&conn, "qt").unwrap();
        insert_ingredient(&conn, "Cream", "pt", Decimal::new(250, 2), None).unwrap();
        assert!(list_units(&conn).unwrap().iter().all(|u| u.code != "qt"));
    }

    #[test]
    fn catalog_keeps_insertion_order_for_duplicates() {
        let conn = setup();
        let herbs = insert_ingredient(&conn, "Parsley", "oz", Decimal::new(75, 2), None).unwrap();
        insert_ingredient_conversion(&conn, herbs, "bunch", "oz", Decimal::new(4, 0)).unwrap();
        insert_ingredient_conversion(&conn, herbs, "bunch", "oz", Decimal::new(5, 0)).unwrap();

        let catalog = load_catalog(&conn).unwrap();
        let resolution = resolve_conversion(&catalog, Decimal::ONE, "bunch", "oz", Some(herbs)).unwrap();
        assert_eq!(resolution.value(), Some(Decimal::new(4, 0)));
        assert_eq!(catalog.conversions.ambiguous_records().len(), 1);
    }

    #[test]
    fn recipe_costs_from_a_loaded_catalog() {
        let conn = setup();
        let scallops = insert_ingredient(&conn, "Scallops", "lb", Decimal::new(1920, 2), Some(Decimal::new(15, 1))).unwrap();
        let recipe = insert_recipe(&conn, "Seared scallops", Decimal::new(24, 0)).unwrap();
        insert_recipe_line(
            &conn,
            &RecipeIngredientLine {
                recipe_id: recipe,
                ingredient_id: scallops,
                quantity: Decimal::new(2, 0),
                unit: "pc".to_string(),
            },
        )
        .unwrap();

        let catalog = load_catalog(&conn).unwrap();
        let cost = calculate_recipe_cost(&catalog, recipe).unwrap();
        assert_eq!(cost.total_cost, Decimal::new(360, 2));
        assert_eq!(cost.food_cost_percent, Some(Decimal::new(15, 0)));
    }

    #[test]
    fn clear_data_empties_every_table() {
        let conn = setup();
        insert_ingredient(&conn, "Salt", "g", Decimal::new(1, 3), None).unwrap();
        insert_universal_conversion(&conn, "pieces", "oz", Decimal::new(6, 1)).unwrap();
        clear_data(&conn).unwrap();

        let catalog = load_catalog(&conn).unwrap();
        assert!(catalog.units.is_empty());
        assert_eq!(catalog.ingredients().count(), 0);
        assert!(catalog.universal_conversions().is_empty());
    }
}
