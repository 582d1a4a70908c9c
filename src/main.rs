//! Recipe Costing
//!
//! Command-line front end for the unit conversion and recipe costing engine.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;

use recipe_costing::costing::{self, summarize_menu};
use recipe_costing::measure::Measure;
use recipe_costing::{Resolution, db, logging, resolve_conversion, sample};

#[derive(Parser)]
#[command(name = "recipe-costing")]
#[command(about = "Unit conversion and recipe costing for restaurant kitchens")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "RECIPE_COSTING_DB", default_value = "costing.db")]
    database: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Load sample units, ingredients and recipes
    LoadSample,

    /// List all units grouped by dimension
    ListUnits,

    /// List all ingredients with their storage unit cost
    ListIngredients,

    /// Convert a measure into another unit (e.g. `convert "2 pc" oz --ingredient 1`)
    Convert {
        /// Quantity and unit, e.g. "2 pc" or "1.5lb"
        measure: String,

        /// Target unit code
        to: String,

        /// Ingredient whose conversions and piece weight apply
        #[arg(short, long)]
        ingredient: Option<i64>,
    },

    /// Cost a quantity of one ingredient
    Cost {
        /// Ingredient ID
        ingredient: i64,

        /// Quantity and unit, e.g. "2 pc"
        measure: String,
    },

    /// Show the cost breakdown for a recipe
    Recipe {
        /// Recipe ID
        id: i64,
    },

    /// Show cost, food cost and margin for every recipe
    Menu,

    /// Delete a unit that nothing references
    DeleteUnit {
        /// Unit code
        code: String,
    },

    /// Report duplicate conversion records
    Audit,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            sample::load_sample_data(&conn)?;
            println!("Sample data loaded successfully!");
        }

        Commands::ListUnits => {
            let units = db::list_units(&conn)?;
            if cli.json {
                print_json(&units)?;
            } else if units.is_empty() {
                println!("No units in database. Run 'load-sample' first.");
            } else {
                println!("{:<8} {:<14} {:<8} {:>16}", "Code", "Name", "Kind", "Factor to base");
                println!("{}", "-".repeat(49));
                for u in units {
                    let factor = u
                        .factor_to_base
                        .map(|f| f.normalize().to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("{:<8} {:<14} {:<8} {:>16}", u.code, u.display_name, u.dimension, factor);
                }
            }
        }

        Commands::ListIngredients => {
            let ingredients = db::list_ingredients(&conn)?;
            if cli.json {
                print_json(&ingredients)?;
            } else if ingredients.is_empty() {
                println!("No ingredients in database. Run 'load-sample' first.");
            } else {
                println!("{:>4} {:<20} {:>10} {:<8} {:>10}", "ID", "Ingredient", "Cost", "Per", "oz/piece");
                println!("{}", "-".repeat(56));
                for i in ingredients {
                    let piece = i
                        .piece_weight_oz
                        .map(|w| w.normalize().to_string())
                        .unwrap_or_default();
                    println!(
                        "{:>4} {:<20} {:>10} {:<8} {:>10}",
                        i.id,
                        i.name,
                        format!("${}", i.cost_per_storage_unit.round_dp(2)),
                        i.storage_unit,
                        piece
                    );
                }
            }
        }

        Commands::Convert {
            measure,
            to,
            ingredient,
        } => {
            let measure: Measure = measure.parse()?;
            let catalog = db::load_catalog(&conn)?;
            let resolution = resolve_conversion(&catalog, measure.quantity, &measure.unit, &to, ingredient)?;

            if cli.json {
                print_json(&resolution)?;
            } else {
                match resolution {
                    Resolution::Converted { value, path } => {
                        println!(
                            "{} {} = {} {} ({})",
                            measure.quantity,
                            measure.unit,
                            value.normalize(),
                            to,
                            path.describe()
                        );
                    }
                    Resolution::Failed(failure) => {
                        println!("No conversion from {} to {}", failure.from_unit, failure.to_unit);
                    }
                }
            }
        }

        Commands::Cost { ingredient, measure } => {
            let measure: Measure = measure.parse()?;
            let catalog = db::load_catalog(&conn)?;
            let cost = costing::calculate_ingredient_cost(&catalog, ingredient, measure.quantity, &measure.unit)?;

            if cli.json {
                print_json(&cost)?;
            } else {
                let name = &catalog.ingredient(ingredient)?.name;
                println!("{} {} {}: ${}", measure.quantity, measure.unit, name, cost.cost.round_dp(2));
                if let Some(path) = cost.path {
                    println!("  via {}", path.describe());
                }
                if let Some(warning) = &cost.warning {
                    println!("  (!) {}", warning);
                }
            }
        }

        Commands::Recipe { id } => {
            let catalog = db::load_catalog(&conn)?;
            let cost = costing::calculate_recipe_cost(&catalog, id)?;

            if cli.json {
                print_json(&cost)?;
            } else {
                println!("{}", cost);
            }
        }

        Commands::Menu => {
            let catalog = db::load_catalog(&conn)?;
            let menu = summarize_menu(&catalog)?;

            if cli.json {
                print_json(&menu)?;
            } else if menu.is_empty() {
                println!("No recipes in database. Run 'load-sample' first.");
            } else {
                println!("{:>4} {:<24} {:>10} {:>10} {:>10} {:>8}", "ID", "Recipe", "Cost", "Price", "Food %", "Margin");
                println!("{}", "-".repeat(71));
                for r in menu {
                    let pct = |v: Option<rust_decimal::Decimal>| {
                        v.map(|p| format!("{}%", p.round_dp(1))).unwrap_or_else(|| "n/a".to_string())
                    };
                    let flag = if r.estimated_lines() > 0 { " (!)" } else { "" };
                    println!(
                        "{:>4} {:<24} {:>10} {:>10} {:>10} {:>8}{}",
                        r.recipe_id,
                        r.name,
                        format!("${}", r.total_cost.round_dp(2)),
                        format!("${}", r.selling_price.round_dp(2)),
                        pct(r.food_cost_percent),
                        pct(r.margin_percent),
                        flag
                    );
                }
            }
        }

        Commands::DeleteUnit { code } => {
            db::delete_unit(&conn, &code)?;
            println!("Deleted unit '{}'", code);
        }

        Commands::Audit => {
            let catalog = db::load_catalog(&conn)?;
            let ambiguous = catalog.conversions.ambiguous_records();

            if cli.json {
                print_json(&ambiguous)?;
            } else if ambiguous.is_empty() {
                println!("No duplicate conversion records.");
            } else {
                println!("Duplicate conversion records (first one is used):");
                for a in ambiguous {
                    let scope = match a.ingredient_id {
                        Some(id) => format!("ingredient {}", id),
                        None => "universal".to_string(),
                    };
                    println!(
                        "  {}: {} -> {} has {} records, using factor {}",
                        scope, a.from_unit, a.to_unit, a.records, a.winning_factor
                    );
                }
            }
        }
    }

    Ok(())
}
