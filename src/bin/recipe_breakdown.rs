//! Print a recipe's per-line nutrition and totals
//! Usage: cargo run --bin recipe_breakdown -- <recipe_id>

use fittrack::config::get_database_path;
use fittrack::db::Database;
use fittrack::tools::recipes;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let recipe_id: i64 = match args.get(1).map(|s| s.parse()) {
        Some(Ok(id)) => id,
        _ => {
            eprintln!("Usage: recipe_breakdown <recipe_id>");
            std::process::exit(2);
        }
    };

    let db_path = get_database_path();
    println!("Database: {}", db_path.display());

    let database = Database::new(&db_path)?;

    let Some(detail) = recipes::get_recipe(&database, recipe_id)? else {
        println!("No recipe found with id: {}", recipe_id);
        return Ok(());
    };

    println!("\n{} (x{})", detail.recipe.name, detail.recipe.scaling_factor);
    println!(
        "{:<4} {:<28} {:>10} {:>10} {:>9} {:>8} {:>8} {:>8} {:>8}",
        "#", "Ingredient", "Quantity", "Grams", "kcal", "Protein", "Carbs", "Fats", "Fiber"
    );

    for line in &detail.lines {
        let name = line.ingredient_name.as_deref().unwrap_or("(deleted)");
        let quantity = format!("{} {}", line.quantity, line.unit_name);
        let n = line.contribution;
        println!(
            "{:<4} {:<28} {:>10} {:>10.1} {:>9.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
            line.order, name, quantity, line.grams, n.calories, n.protein, n.carbs, n.fats, n.fiber
        );
    }

    let t = detail.nutrition;
    println!(
        "\nTotal: {:.2} kcal | protein {:.2} g | carbs {:.2} g | fats {:.2} g | fiber {:.2} g",
        t.calories, t.protein, t.carbs, t.fats, t.fiber
    );

    Ok(())
}
