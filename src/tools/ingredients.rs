//! Ingredient MCP Tools
//!
//! Tools for managing ingredients and their custom units.

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{
    CustomUnit, CustomUnitCreate, Ingredient, IngredientCreate, IngredientUpdate, Nutrition,
};
use super::{require_name, DeleteResponse};

/// Full ingredient detail with its units
#[derive(Debug, Serialize)]
pub struct IngredientDetail {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub custom_units: Vec<CustomUnit>,
    pub recipe_line_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ListIngredientsResponse {
    pub ingredients: Vec<Ingredient>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteIngredientResponse {
    pub success: bool,
    pub deleted_id: i64,
    /// Recipe lines still pointing at the deleted ingredient; they now contribute nothing
    pub orphaned_recipe_lines: i64,
}

#[derive(Debug, Serialize)]
pub struct ListCustomUnitsResponse {
    pub custom_units: Vec<CustomUnit>,
    pub count: usize,
}

fn validate_coefficients(n: &Nutrition) -> Result<(), String> {
    if let Some(field) = n.first_negative() {
        return Err(format!("{} must be 0 or greater", field));
    }
    if n.sanitized() != *n {
        return Err("Nutrition values must be finite numbers".to_string());
    }
    Ok(())
}

// ============================================================================
// Ingredient Tools
// ============================================================================

/// Create a new ingredient
pub fn add_ingredient(db: &Database, data: IngredientCreate) -> Result<Ingredient, String> {
    let name = require_name(&data.name, "Ingredient")?;
    validate_coefficients(&data.per_gram)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredient = Ingredient::create(&conn, &IngredientCreate { name, ..data })
        .map_err(|e| format!("Failed to create ingredient: {}", e))?;

    info!("Created ingredient {} ({})", ingredient.id, ingredient.name);
    Ok(ingredient)
}

/// Get an ingredient with its custom units
pub fn get_ingredient(db: &Database, id: i64) -> Result<Option<IngredientDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(ingredient) = Ingredient::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?
    else {
        return Ok(None);
    };

    let custom_units = CustomUnit::list_for_ingredient(&conn, id)
        .map_err(|e| format!("Failed to get custom units: {}", e))?;
    let recipe_line_count = Ingredient::count_recipe_lines(&conn, id)
        .map_err(|e| format!("Failed to count recipe usage: {}", e))?;

    Ok(Some(IngredientDetail {
        ingredient,
        custom_units,
        recipe_line_count,
    }))
}

/// List all ingredients
pub fn list_ingredients(db: &Database) -> Result<ListIngredientsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredients = Ingredient::list(&conn)
        .map_err(|e| format!("Failed to list ingredients: {}", e))?;

    Ok(ListIngredientsResponse {
        count: ingredients.len(),
        ingredients,
    })
}

/// Search ingredients by name
pub fn search_ingredients(db: &Database, query: &str, limit: i64) -> Result<ListIngredientsResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredients = Ingredient::search(&conn, query, limit)
        .map_err(|e| format!("Failed to search ingredients: {}", e))?;

    Ok(ListIngredientsResponse {
        count: ingredients.len(),
        ingredients,
    })
}

/// Update an ingredient
pub fn update_ingredient(db: &Database, id: i64, data: IngredientUpdate) -> Result<Option<Ingredient>, String> {
    let name = data
        .name
        .as_deref()
        .map(|n| require_name(n, "Ingredient"))
        .transpose()?;

    let proposed = Nutrition {
        calories: data.calories.unwrap_or(0.0),
        protein: data.protein.unwrap_or(0.0),
        carbs: data.carbs.unwrap_or(0.0),
        fats: data.fats.unwrap_or(0.0),
        fiber: data.fiber.unwrap_or(0.0),
    };
    validate_coefficients(&proposed)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Ingredient::update(&conn, id, &IngredientUpdate { name, ..data })
        .map_err(|e| format!("Failed to update ingredient: {}", e))
}

/// Delete an ingredient and its custom units. Recipe lines referencing it are kept.
pub fn delete_ingredient(db: &Database, id: i64) -> Result<Option<DeleteIngredientResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let orphaned_recipe_lines = Ingredient::count_recipe_lines(&conn, id)
        .map_err(|e| format!("Failed to count recipe usage: {}", e))?;

    let deleted = Ingredient::delete(&conn, id)
        .map_err(|e| format!("Failed to delete ingredient: {}", e))?;

    if !deleted {
        return Ok(None);
    }

    info!("Deleted ingredient {} ({} recipe lines orphaned)", id, orphaned_recipe_lines);
    Ok(Some(DeleteIngredientResponse {
        success: true,
        deleted_id: id,
        orphaned_recipe_lines,
    }))
}

// ============================================================================
// Custom Unit Tools
// ============================================================================

/// Define a custom unit for an ingredient
pub fn add_custom_unit(db: &Database, data: CustomUnitCreate) -> Result<CustomUnit, String> {
    let unit_name = require_name(&data.unit_name, "Unit")?;
    if !data.grams_equivalent.is_finite() || data.grams_equivalent <= 0.0 {
        return Err("grams_equivalent must be greater than 0".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Ingredient::get_by_id(&conn, data.ingredient_id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?
        .ok_or_else(|| format!("Ingredient not found with id: {}", data.ingredient_id))?;

    CustomUnit::create(&conn, &CustomUnitCreate { unit_name, ..data })
        .map_err(|e| format!("Failed to create custom unit: {}", e))
}

/// List custom units, for one ingredient or all
pub fn list_custom_units(db: &Database, ingredient_id: Option<i64>) -> Result<ListCustomUnitsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let custom_units = match ingredient_id {
        Some(id) => CustomUnit::list_for_ingredient(&conn, id),
        None => CustomUnit::list_all(&conn),
    }
    .map_err(|e| format!("Failed to list custom units: {}", e))?;

    Ok(ListCustomUnitsResponse {
        count: custom_units.len(),
        custom_units,
    })
}

/// Delete a custom unit. Lines using it fall back to grams.
pub fn delete_custom_unit(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = CustomUnit::delete(&conn, id)
        .map_err(|e| format!("Failed to delete custom unit: {}", e))?;

    Ok(deleted.then_some(DeleteResponse {
        success: true,
        deleted_id: id,
    }))
}
