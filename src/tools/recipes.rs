//! Recipe MCP Tools
//!
//! Tools for managing recipes and their ingredient lines.

use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::db::{Database, DbError, DbResult};
use crate::models::{
    CustomUnit, Ingredient, Nutrition, Recipe, RecipeCreate, RecipeIngredient,
    RecipeIngredientCreate, RecipeIngredientUpdate, RecipeUpdate,
};
use crate::nutrition::{self, grams_for_line, Line, UnitRef};
use super::{require_name, DeleteResponse};

/// One recipe line as shown in the editor
#[derive(Debug, Serialize)]
pub struct RecipeLineDetail {
    pub id: i64,
    pub order: i64,
    pub ingredient_id: i64,
    /// `None` when the ingredient has been deleted
    pub ingredient_name: Option<String>,
    pub unit_id: Option<i64>,
    pub unit_name: String,
    pub quantity: f64,
    pub grams: f64,
    /// This line's share of the totals, after scaling
    pub contribution: Nutrition,
}

/// Full recipe detail with lines and nutrition
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub lines: Vec<RecipeLineDetail>,
    pub nutrition: Nutrition,
}

/// Recipe summary for listing
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub scaling_factor: f64,
    pub calories: f64,
    pub line_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub recipe_id: i64,
    pub line_ids: Vec<i64>,
}

/// Totals for a stored recipe. Shared with daily logging.
pub(crate) fn compute_recipe_nutrition(conn: &Connection, recipe: &Recipe) -> DbResult<Nutrition> {
    let lines: Vec<Line> = RecipeIngredient::get_for_recipe(conn, recipe.id)?
        .iter()
        .map(Line::from)
        .collect();
    nutrition::recipe_totals(conn, &lines, Some(recipe.scaling_factor))
}

fn line_detail(conn: &Connection, recipe: &Recipe, line: &RecipeIngredient) -> DbResult<RecipeLineDetail> {
    let ingredient_name = Ingredient::get_by_id(conn, line.ingredient_id)?.map(|i| i.name);
    let unit = match line.unit_id {
        Some(unit_id) => CustomUnit::get_by_id(conn, unit_id)?,
        None => None,
    };
    let contribution = nutrition::line_contribution(conn, &Line::from(line), Some(recipe.scaling_factor))?;

    Ok(RecipeLineDetail {
        id: line.id,
        order: line.order,
        ingredient_id: line.ingredient_id,
        ingredient_name,
        unit_id: line.unit_id,
        unit_name: unit.as_ref().map(|u| u.unit_name.clone()).unwrap_or_else(|| "g".to_string()),
        quantity: line.quantity,
        grams: grams_for_line(line.quantity, unit.as_ref()),
        contribution,
    })
}

/// The unit must exist and belong to the line's ingredient
pub(crate) fn check_unit(conn: &Connection, ingredient_id: i64, unit: UnitRef) -> Result<(), String> {
    let UnitRef::Custom(unit_id) = unit else {
        return Ok(());
    };
    let unit = CustomUnit::get_by_id(conn, unit_id)
        .map_err(|e| format!("Failed to get custom unit: {}", e))?
        .ok_or_else(|| format!("Custom unit not found with id: {}", unit_id))?;
    if unit.ingredient_id != ingredient_id {
        return Err(format!(
            "Custom unit {} ({}) belongs to ingredient {}, not {}",
            unit.id, unit.unit_name, unit.ingredient_id, ingredient_id
        ));
    }
    Ok(())
}

fn check_quantity(quantity: f64) -> Result<(), String> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err("quantity must be greater than 0".to_string());
    }
    Ok(())
}

// ============================================================================
// Recipe Tools
// ============================================================================

/// Create a new recipe
pub fn create_recipe(db: &Database, data: RecipeCreate) -> Result<Recipe, String> {
    let name = require_name(&data.name, "Recipe")?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::create(&conn, &RecipeCreate { name, ..data })
        .map_err(|e| format!("Failed to create recipe: {}", e))?;

    info!("Created recipe {} ({})", recipe.id, recipe.name);
    Ok(recipe)
}

/// Get a recipe with its lines and computed nutrition
pub fn get_recipe(db: &Database, id: i64) -> Result<Option<RecipeDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(recipe) = Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?
    else {
        return Ok(None);
    };

    let lines: Vec<RecipeLineDetail> = RecipeIngredient::get_for_recipe(&conn, id)
        .and_then(|lines| lines.iter().map(|l| line_detail(&conn, &recipe, l)).collect())
        .map_err(|e| format!("Failed to get recipe lines: {}", e))?;

    let nutrition = compute_recipe_nutrition(&conn, &recipe)
        .map_err(|e| format!("Failed to compute nutrition: {}", e))?;

    Ok(Some(RecipeDetail {
        recipe,
        lines,
        nutrition,
    }))
}

/// List recipes with their calorie totals
pub fn list_recipes(db: &Database, query: Option<&str>) -> Result<ListRecipesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipes = Recipe::list(&conn, query)
        .map_err(|e| format!("Failed to list recipes: {}", e))?;

    let mut summaries = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let line_count = RecipeIngredient::get_for_recipe(&conn, recipe.id)
            .map_err(|e| format!("Failed to get recipe lines: {}", e))?
            .len();
        let nutrition = compute_recipe_nutrition(&conn, &recipe)
            .map_err(|e| format!("Failed to compute nutrition: {}", e))?;

        summaries.push(RecipeSummary {
            id: recipe.id,
            name: recipe.name,
            scaling_factor: recipe.scaling_factor,
            calories: nutrition.calories,
            line_count,
        });
    }

    Ok(ListRecipesResponse {
        count: summaries.len(),
        recipes: summaries,
    })
}

/// Update a recipe. A non-positive scaling factor is stored as 1.
pub fn update_recipe(db: &Database, id: i64, data: RecipeUpdate) -> Result<Option<Recipe>, String> {
    let name = data
        .name
        .as_deref()
        .map(|n| require_name(n, "Recipe"))
        .transpose()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Recipe::update(&conn, id, &RecipeUpdate { name, ..data })
        .map_err(|e| format!("Failed to update recipe: {}", e))
}

/// Delete a recipe and all of its lines
pub fn delete_recipe(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let deleted = db
        .transaction(|tx| Recipe::delete(tx, id))
        .map_err(|e| format!("Failed to delete recipe: {}", e))?;

    if deleted {
        info!("Deleted recipe {}", id);
    }
    Ok(deleted.then_some(DeleteResponse {
        success: true,
        deleted_id: id,
    }))
}

// ============================================================================
// Recipe Line Tools
// ============================================================================

/// Append an ingredient line to a recipe
pub fn add_recipe_ingredient(db: &Database, data: RecipeIngredientCreate) -> Result<RecipeLineDetail, String> {
    check_quantity(data.quantity)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, data.recipe_id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?
        .ok_or_else(|| format!("Recipe not found with id: {}", data.recipe_id))?;

    Ingredient::get_by_id(&conn, data.ingredient_id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?
        .ok_or_else(|| format!("Ingredient not found with id: {}", data.ingredient_id))?;

    check_unit(&conn, data.ingredient_id, data.unit)?;

    let line = RecipeIngredient::create(&conn, &data)
        .map_err(|e| format!("Failed to add ingredient: {}", e))?;

    line_detail(&conn, &recipe, &line).map_err(|e| format!("Failed to load line: {}", e))
}

/// Change a line's quantity or unit
pub fn update_recipe_ingredient(
    db: &Database,
    id: i64,
    data: RecipeIngredientUpdate,
) -> Result<Option<RecipeLineDetail>, String> {
    if let Some(quantity) = data.quantity {
        check_quantity(quantity)?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(existing) = RecipeIngredient::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get recipe line: {}", e))?
    else {
        return Ok(None);
    };

    if let Some(unit) = data.unit {
        check_unit(&conn, existing.ingredient_id, unit)?;
    }

    let line = RecipeIngredient::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update recipe line: {}", e))?
        .ok_or_else(|| DbError::NotFound("Recipe ingredient", id).to_string())?;

    let recipe = Recipe::get_by_id(&conn, line.recipe_id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?
        .ok_or_else(|| format!("Recipe not found with id: {}", line.recipe_id))?;

    line_detail(&conn, &recipe, &line)
        .map(Some)
        .map_err(|e| format!("Failed to load line: {}", e))
}

/// Remove a line from its recipe
pub fn remove_recipe_ingredient(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = RecipeIngredient::delete(&conn, id)
        .map_err(|e| format!("Failed to remove recipe line: {}", e))?;

    Ok(deleted.then_some(DeleteResponse {
        success: true,
        deleted_id: id,
    }))
}

/// Put a recipe's lines in the given order, renumbering them from 0
pub fn reorder_recipe_ingredients(
    db: &Database,
    recipe_id: i64,
    line_ids: Vec<i64>,
) -> Result<ReorderResponse, String> {
    let lines = db
        .transaction(|tx| {
            Recipe::get_by_id(tx, recipe_id)?.ok_or(DbError::NotFound("Recipe", recipe_id))?;
            RecipeIngredient::reorder(tx, recipe_id, &line_ids)
        })
        .map_err(|e| format!("Failed to reorder recipe lines: {}", e))?;

    Ok(ReorderResponse {
        recipe_id,
        line_ids: lines.iter().map(|l| l.id).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomUnitCreate, IngredientCreate};
    use crate::tools::ingredients::{add_custom_unit, add_ingredient, delete_ingredient};

    fn ingredient(db: &Database, name: &str, per_gram: Nutrition) -> Ingredient {
        add_ingredient(db, IngredientCreate { name: name.into(), per_gram }).unwrap()
    }

    fn recipe(db: &Database, name: &str, scaling_factor: Option<f64>) -> Recipe {
        create_recipe(db, RecipeCreate { name: name.into(), instructions: None, scaling_factor }).unwrap()
    }

    fn add_line(db: &Database, recipe_id: i64, ingredient_id: i64, unit: UnitRef, quantity: f64) -> RecipeLineDetail {
        add_recipe_ingredient(db, RecipeIngredientCreate { recipe_id, ingredient_id, unit, quantity }).unwrap()
    }

    #[test]
    fn test_recipe_detail_totals_and_contributions() {
        let db = Database::in_memory().unwrap();
        let potato = ingredient(&db, "Potato", Nutrition { calories: 1.5, protein: 0.1, ..Default::default() });
        let bag = add_custom_unit(
            &db,
            CustomUnitCreate { ingredient_id: potato.id, unit_name: "bag".into(), grams_equivalent: 100.0 },
        )
        .unwrap();
        let oil = ingredient(&db, "Olive oil", Nutrition { calories: 8.84, fats: 1.0, ..Default::default() });

        let r = recipe(&db, "Roast potatoes", Some(2.0));
        add_line(&db, r.id, potato.id, UnitRef::Custom(bag.id), 2.0);
        add_line(&db, r.id, oil.id, UnitRef::Grams, 10.0);

        let detail = get_recipe(&db, r.id).unwrap().unwrap();
        assert_eq!(detail.lines.len(), 2);
        assert_eq!(detail.lines[0].unit_name, "bag");
        assert_eq!(detail.lines[0].grams, 200.0);
        assert_eq!(detail.lines[0].contribution.calories, 600.0);
        assert_eq!(detail.lines[1].contribution.calories, 176.8);
        assert_eq!(detail.nutrition.calories, 776.8);
        assert_eq!(detail.nutrition.protein, 40.0);
        assert_eq!(detail.nutrition.fats, 20.0);
    }

    #[test]
    fn test_deleted_ingredient_line_dangles() {
        let db = Database::in_memory().unwrap();
        let rice = ingredient(&db, "Rice", Nutrition { calories: 1.3, ..Default::default() });
        let beans = ingredient(&db, "Beans", Nutrition { calories: 1.2, ..Default::default() });
        let r = recipe(&db, "Rice and beans", None);
        add_line(&db, r.id, rice.id, UnitRef::Grams, 100.0);
        add_line(&db, r.id, beans.id, UnitRef::Grams, 100.0);

        let deleted = delete_ingredient(&db, beans.id).unwrap().unwrap();
        assert_eq!(deleted.orphaned_recipe_lines, 1);

        let detail = get_recipe(&db, r.id).unwrap().unwrap();
        assert_eq!(detail.lines.len(), 2);
        assert_eq!(detail.lines[1].ingredient_name, None);
        assert!(detail.lines[1].contribution.is_zero());
        assert_eq!(detail.nutrition.calories, 130.0);
    }

    #[test]
    fn test_add_line_validation() {
        let db = Database::in_memory().unwrap();
        let milk = ingredient(&db, "Milk", Nutrition { calories: 0.42, ..Default::default() });
        let flour = ingredient(&db, "Flour", Nutrition { calories: 3.64, ..Default::default() });
        let cup = add_custom_unit(
            &db,
            CustomUnitCreate { ingredient_id: flour.id, unit_name: "cup".into(), grams_equivalent: 125.0 },
        )
        .unwrap();
        let r = recipe(&db, "Pancakes", None);

        let missing = RecipeIngredientCreate { recipe_id: r.id, ingredient_id: 999, unit: UnitRef::Grams, quantity: 1.0 };
        assert!(add_recipe_ingredient(&db, missing).is_err());

        let foreign_unit = RecipeIngredientCreate { recipe_id: r.id, ingredient_id: milk.id, unit: UnitRef::Custom(cup.id), quantity: 1.0 };
        assert!(add_recipe_ingredient(&db, foreign_unit).unwrap_err().contains("belongs to"));

        let zero = RecipeIngredientCreate { recipe_id: r.id, ingredient_id: milk.id, unit: UnitRef::Grams, quantity: 0.0 };
        assert!(add_recipe_ingredient(&db, zero).is_err());
    }

    #[test]
    fn test_reorder_and_delete() {
        let db = Database::in_memory().unwrap();
        let a = ingredient(&db, "A", Nutrition::zero());
        let b = ingredient(&db, "B", Nutrition::zero());
        let r = recipe(&db, "Mix", None);
        let first = add_line(&db, r.id, a.id, UnitRef::Grams, 1.0);
        let second = add_line(&db, r.id, b.id, UnitRef::Grams, 1.0);

        let reordered = reorder_recipe_ingredients(&db, r.id, vec![second.id, first.id]).unwrap();
        assert_eq!(reordered.line_ids, vec![second.id, first.id]);

        let detail = get_recipe(&db, r.id).unwrap().unwrap();
        assert_eq!(detail.lines[0].id, second.id);
        assert_eq!(detail.lines[0].order, 0);

        assert!(delete_recipe(&db, r.id).unwrap().is_some());
        assert!(get_recipe(&db, r.id).unwrap().is_none());
        let lines_left: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM recipe_ingredients", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(lines_left, 0);
    }

    #[test]
    fn test_update_line_changes_totals() {
        let db = Database::in_memory().unwrap();
        let oats = ingredient(&db, "Oats", Nutrition { calories: 3.9, ..Default::default() });
        let r = recipe(&db, "Porridge", None);
        let line = add_line(&db, r.id, oats.id, UnitRef::Grams, 50.0);

        let update = RecipeIngredientUpdate { quantity: Some(80.0), unit: None };
        let updated = update_recipe_ingredient(&db, line.id, update).unwrap().unwrap();
        assert_eq!(updated.contribution.calories, 312.0);

        let summary = list_recipes(&db, None).unwrap();
        assert_eq!(summary.recipes[0].calories, 312.0);
        assert_eq!(summary.recipes[0].line_count, 1);
    }

    #[test]
    fn test_list_recipes_with_query() {
        let db = Database::in_memory().unwrap();
        let rice = ingredient(&db, "Rice", Nutrition { calories: 1.3, ..Default::default() });
        let fried = recipe(&db, "Fried rice", None);
        add_line(&db, fried.id, rice.id, UnitRef::Grams, 200.0);
        recipe(&db, "Pancakes", None);

        let found = list_recipes(&db, Some("RICE")).unwrap();
        assert_eq!(found.count, 1);
        assert_eq!(found.recipes[0].id, fried.id);
        assert_eq!(found.recipes[0].calories, 260.0);

        assert_eq!(list_recipes(&db, Some("soup")).unwrap().count, 0);
        assert_eq!(list_recipes(&db, None).unwrap().count, 2);
    }

    #[test]
    fn test_unknown_unit_rejected() {
        let db = Database::in_memory().unwrap();
        let rice = ingredient(&db, "Rice", Nutrition { calories: 1.3, ..Default::default() });
        let r = recipe(&db, "Plain rice", None);

        let unknown = RecipeIngredientCreate { recipe_id: r.id, ingredient_id: rice.id, unit: UnitRef::Custom(999), quantity: 2.0 };
        assert!(add_recipe_ingredient(&db, unknown).unwrap_err().contains("Custom unit not found"));
        assert!(get_recipe(&db, r.id).unwrap().unwrap().lines.is_empty());
    }
}
