//! Daily Nutrition MCP Tools
//!
//! Reading and editing the per-date nutrition record, and logging food into it.

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{DailyNutrition, DailyValues, Ingredient, Nutrition, Recipe};
use crate::nutrition::{self, Contribution, Line, UnitRef};
use super::recipes::{check_unit, compute_recipe_nutrition};
use super::{validate_date, DeleteResponse};

#[derive(Debug, Serialize)]
pub struct ListDailyNutritionResponse {
    pub days: Vec<DailyNutrition>,
    pub count: usize,
}

/// Result of a logging call: what was added and the day afterwards
#[derive(Debug, Serialize)]
pub struct LogResponse {
    pub date: String,
    pub source: String,
    pub added: Contribution,
    pub day: DailyNutrition,
}

fn validate_values(values: &DailyValues) -> Result<(), String> {
    match values.first_invalid() {
        Some(field) => Err(format!("{} must be a number 0 or greater", field)),
        None => Ok(()),
    }
}

/// Get the record for a date
pub fn get_daily_nutrition(db: &Database, date: &str) -> Result<Option<DailyNutrition>, String> {
    let date = validate_date(date)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    DailyNutrition::get_by_date(&conn, &date)
        .map_err(|e| format!("Failed to get daily nutrition: {}", e))
}

/// List records, newest first, optionally within an inclusive date range
pub fn list_daily_nutrition(
    db: &Database,
    start_date: Option<&str>,
    end_date: Option<&str>,
    limit: i64,
) -> Result<ListDailyNutritionResponse, String> {
    let start_date = start_date.map(validate_date).transpose()?;
    let end_date = end_date.map(validate_date).transpose()?;
    let limit = limit.clamp(1, 366);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let days = DailyNutrition::list(&conn, start_date.as_deref(), end_date.as_deref(), limit)
        .map_err(|e| format!("Failed to list daily nutrition: {}", e))?;

    Ok(ListDailyNutritionResponse {
        count: days.len(),
        days,
    })
}

/// Set the provided fields for a date (no addition)
pub fn save_daily_nutrition(db: &Database, date: &str, values: DailyValues) -> Result<DailyNutrition, String> {
    let date = validate_date(date)?;
    validate_values(&values)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    DailyNutrition::save(&conn, &date, &values)
        .map_err(|e| format!("Failed to save daily nutrition: {}", e))
}

/// Set the provided fields on a record by id
pub fn update_daily_nutrition(db: &Database, id: i64, values: DailyValues) -> Result<Option<DailyNutrition>, String> {
    validate_values(&values)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    DailyNutrition::update(&conn, id, &values)
        .map_err(|e| format!("Failed to update daily nutrition: {}", e))
}

pub fn delete_daily_nutrition(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = DailyNutrition::delete(&conn, id)
        .map_err(|e| format!("Failed to delete daily nutrition: {}", e))?;

    Ok(deleted.then_some(DeleteResponse {
        success: true,
        deleted_id: id,
    }))
}

// ============================================================================
// Logging (merge-on-write)
// ============================================================================

fn log(db: &Database, date: &str, source: String, contribution: Contribution) -> Result<LogResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let day = nutrition::log_contribution(&conn, date, &contribution)
        .map_err(|e| format!("Failed to log nutrition: {}", e))?;

    info!("Logged {} to {}", source, date);
    Ok(LogResponse {
        date: date.to_string(),
        source,
        added: contribution,
        day,
    })
}

/// Add one full recipe to a date
pub fn log_recipe(db: &Database, date: &str, recipe_id: i64) -> Result<LogResponse, String> {
    let date = validate_date(date)?;

    let (recipe, totals) = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        let recipe = Recipe::get_by_id(&conn, recipe_id)
            .map_err(|e| format!("Failed to get recipe: {}", e))?
            .ok_or_else(|| format!("Recipe not found with id: {}", recipe_id))?;
        let totals = compute_recipe_nutrition(&conn, &recipe)
            .map_err(|e| format!("Failed to compute nutrition: {}", e))?;
        (recipe, totals)
    };

    log(db, &date, format!("recipe '{}'", recipe.name), Contribution::food(totals))
}

/// Add a quantity of an ingredient to a date
pub fn log_ingredient(
    db: &Database,
    date: &str,
    ingredient_id: i64,
    quantity: f64,
    unit: UnitRef,
) -> Result<LogResponse, String> {
    let date = validate_date(date)?;
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err("quantity must be greater than 0".to_string());
    }

    let (ingredient, totals) = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        let ingredient = Ingredient::get_by_id(&conn, ingredient_id)
            .map_err(|e| format!("Failed to get ingredient: {}", e))?
            .ok_or_else(|| format!("Ingredient not found with id: {}", ingredient_id))?;

        check_unit(&conn, ingredient_id, unit)?;

        let line = Line { ingredient_id, unit, quantity };
        let totals = nutrition::recipe_totals(&*conn, &[line], None)
            .map_err(|e| format!("Failed to compute nutrition: {}", e))?;
        (ingredient, totals)
    };

    log(db, &date, format!("ingredient '{}'", ingredient.name), Contribution::food(totals))
}

/// Add raw values to a date. The only path that adds water.
pub fn log_manual_nutrition(
    db: &Database,
    date: &str,
    nutrition: Nutrition,
    water: Option<f64>,
) -> Result<LogResponse, String> {
    let date = validate_date(date)?;

    let as_values = DailyValues {
        calories: Some(nutrition.calories),
        protein: Some(nutrition.protein),
        carbs: Some(nutrition.carbs),
        fats: Some(nutrition.fats),
        fiber: Some(nutrition.fiber),
        water,
    };
    validate_values(&as_values)?;

    let contribution = Contribution {
        nutrition: nutrition.rounded(),
        water,
    };
    log(db, &date, "manual entry".to_string(), contribution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomUnitCreate, IngredientCreate, RecipeCreate, RecipeIngredientCreate};
    use crate::tools::ingredients::{add_custom_unit, add_ingredient};
    use crate::tools::recipes::{add_recipe_ingredient, create_recipe};

    fn seed_recipe(db: &Database) -> i64 {
        let pasta = add_ingredient(
            db,
            IngredientCreate { name: "Pasta".into(), per_gram: Nutrition { calories: 3.5, protein: 0.12, ..Default::default() } },
        )
        .unwrap();
        let recipe = create_recipe(db, RecipeCreate { name: "Pasta bowl".into(), instructions: None, scaling_factor: None }).unwrap();
        add_recipe_ingredient(
            db,
            RecipeIngredientCreate { recipe_id: recipe.id, ingredient_id: pasta.id, unit: UnitRef::Grams, quantity: 120.0 },
        )
        .unwrap();
        recipe.id
    }

    #[test]
    fn test_log_recipe_twice_doubles() {
        let db = Database::in_memory().unwrap();
        let recipe_id = seed_recipe(&db);

        let first = log_recipe(&db, "2025-07-01", recipe_id).unwrap();
        assert_eq!(first.day.values.calories, Some(420.0));

        let second = log_recipe(&db, "2025-07-01", recipe_id).unwrap();
        assert_eq!(second.day.values.calories, Some(840.0));
        assert_eq!(second.day.values.protein, Some(28.8));
        assert_eq!(second.day.id, first.day.id);
    }

    #[test]
    fn test_log_recipe_keeps_water() {
        let db = Database::in_memory().unwrap();
        let recipe_id = seed_recipe(&db);

        log_manual_nutrition(&db, "2025-07-02", Nutrition::zero(), Some(1.25)).unwrap();
        let logged = log_recipe(&db, "2025-07-02", recipe_id).unwrap();
        assert_eq!(logged.day.values.water, Some(1.25));
        assert_eq!(logged.added.water, None);
    }

    #[test]
    fn test_log_ingredient_with_units() {
        let db = Database::in_memory().unwrap();
        let egg = add_ingredient(
            &db,
            IngredientCreate { name: "Egg".into(), per_gram: Nutrition { calories: 1.43, protein: 0.126, ..Default::default() } },
        )
        .unwrap();
        let large = add_custom_unit(
            &db,
            CustomUnitCreate { ingredient_id: egg.id, unit_name: "large".into(), grams_equivalent: 50.0 },
        )
        .unwrap();

        let two_eggs = log_ingredient(&db, "2025-07-03", egg.id, 2.0, UnitRef::Custom(large.id)).unwrap();
        assert_eq!(two_eggs.added.nutrition.calories, 143.0);

        let grams = log_ingredient(&db, "2025-07-03", egg.id, 100.0, UnitRef::Grams).unwrap();
        assert_eq!(grams.day.values.calories, Some(286.0));
        assert_eq!(grams.day.values.protein, Some(25.2));
    }

    #[test]
    fn test_log_ingredient_rejects_unknown_unit() {
        let db = Database::in_memory().unwrap();
        let rice = add_ingredient(
            &db,
            IngredientCreate { name: "Rice".into(), per_gram: Nutrition { calories: 1.3, ..Default::default() } },
        )
        .unwrap();

        let err = log_ingredient(&db, "2025-08-01", rice.id, 2.0, UnitRef::Custom(999)).unwrap_err();
        assert!(err.contains("Custom unit not found"));
        assert!(get_daily_nutrition(&db, "2025-08-01").unwrap().is_none());
    }

    #[test]
    fn test_log_missing_ingredient_errors() {
        let db = Database::in_memory().unwrap();
        assert!(log_ingredient(&db, "2025-07-04", 42, 100.0, UnitRef::Grams).is_err());
        assert!(log_recipe(&db, "2025-07-04", 42).is_err());
        assert!(get_daily_nutrition(&db, "2025-07-04").unwrap().is_none());
    }

    #[test]
    fn test_manual_entry_validation() {
        let db = Database::in_memory().unwrap();
        let negative = Nutrition { calories: -5.0, ..Default::default() };
        assert!(log_manual_nutrition(&db, "2025-07-05", negative, None).is_err());
        assert!(log_manual_nutrition(&db, "07/05/2025", Nutrition::zero(), None).is_err());
    }

    #[test]
    fn test_save_then_log_adds_on_top() {
        let db = Database::in_memory().unwrap();
        save_daily_nutrition(&db, "2025-07-06", DailyValues { calories: Some(1000.0), ..Default::default() }).unwrap();

        let logged = log_manual_nutrition(
            &db,
            "2025-07-06",
            Nutrition { calories: 250.5, fiber: 3.0, ..Default::default() },
            None,
        )
        .unwrap();
        assert_eq!(logged.day.values.calories, Some(1250.5));
        assert_eq!(logged.day.values.fiber, Some(3.0));

        let listed = list_daily_nutrition(&db, Some("2025-07-01"), None, 30).unwrap();
        assert_eq!(listed.count, 1);

        let id = logged.day.id;
        let updated = update_daily_nutrition(&db, id, DailyValues { water: Some(2.0), ..Default::default() })
            .unwrap()
            .unwrap();
        assert_eq!(updated.values.water, Some(2.0));
        assert_eq!(updated.values.calories, Some(1250.5));

        assert!(delete_daily_nutrition(&db, id).unwrap().is_some());
        assert!(get_daily_nutrition(&db, "2025-07-06").unwrap().is_none());
    }
}
