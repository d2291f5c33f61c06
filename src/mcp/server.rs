//! FitTrack MCP Server Implementation
//!
//! Implements the MCP server with all FitTrack tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{
    BodyMetrics, CustomUnitCreate, DailyValues, ExerciseCreate, ExerciseUpdate, HabitUpdate,
    IngredientCreate, IngredientUpdate, Muscle, Nutrition, RecipeCreate, RecipeIngredientCreate,
    RecipeIngredientUpdate, RecipeUpdate, WorkoutEntryCreate, WorkoutEntryUpdate,
    WorkoutPlanUpdate,
};
use crate::nutrition::UnitRef;
use crate::tools::status::StatusTracker;
use crate::tools::{body_metrics, daily, habits, ingredients, recipes, workouts};

/// FitTrack MCP Service
#[derive(Clone)]
pub struct FitTrackService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<FitTrackService>,
}

impl FitTrackService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

/// Serialize a tool result as pretty JSON text content
fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Serialize an optional result, answering `{"error": ...}` when absent
fn json_or_not_found<T: Serialize>(value: Option<T>, what: &str, id: impl Serialize) -> Result<CallToolResult, McpError> {
    match value {
        Some(v) => json_result(&v),
        None => json_result(&serde_json::json!({ "error": format!("{} not found", what), "id": id })),
    }
}

fn parse_unit(unit: Option<&str>) -> Result<UnitRef, McpError> {
    let raw = unit.unwrap_or("grams");
    UnitRef::parse(raw).ok_or_else(|| {
        McpError::invalid_params(
            format!("Invalid unit '{}': use \"grams\" or a custom unit id", raw),
            None,
        )
    })
}

fn parse_muscle_list(names: &[String]) -> Result<Vec<Muscle>, McpError> {
    workouts::parse_muscles(names).map_err(|e| McpError::invalid_params(e, None))
}

// ============================================================================
// Ingredient Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddIngredientParams {
    /// Ingredient name
    pub name: String,
    /// Calories per gram (e.g. 3.89 for 389 kcal/100g)
    #[serde(default)]
    pub calories: f64,
    /// Protein grams per gram
    #[serde(default)]
    pub protein: f64,
    /// Carbohydrate grams per gram
    #[serde(default)]
    pub carbs: f64,
    /// Fat grams per gram
    #[serde(default)]
    pub fats: f64,
    /// Fiber grams per gram
    #[serde(default)]
    pub fiber: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateIngredientParams {
    pub id: i64,
    pub name: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
    pub fiber: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddCustomUnitParams {
    /// Ingredient this unit belongs to
    pub ingredient_id: i64,
    /// Unit name, e.g. "cup", "slice"
    pub unit_name: String,
    /// Grams in one unit (must be > 0)
    pub grams_equivalent: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListCustomUnitsParams {
    /// Only units of this ingredient (optional)
    pub ingredient_id: Option<i64>,
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    pub name: String,
    pub instructions: Option<String>,
    /// Multiplier applied to all ingredient nutrition (default 1; 0 or less means 1)
    pub scaling_factor: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecipesParams {
    /// Filter by name (optional)
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeParams {
    pub id: i64,
    pub name: Option<String>,
    pub instructions: Option<String>,
    pub scaling_factor: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRecipeIngredientParams {
    pub recipe_id: i64,
    pub ingredient_id: i64,
    /// Amount in grams, or count of the custom unit
    pub quantity: f64,
    /// "grams" (default) or a custom unit id of this ingredient
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeIngredientParams {
    /// Recipe line ID
    pub id: i64,
    pub quantity: Option<f64>,
    /// "grams" or a custom unit id (optional)
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReorderRecipeIngredientsParams {
    pub recipe_id: i64,
    /// Every line ID of the recipe, in the desired order
    pub line_ids: Vec<i64>,
}

// ============================================================================
// Daily Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateParams {
    /// Date in YYYY-MM-DD format
    pub date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateRangeParams {
    /// Inclusive start date YYYY-MM-DD (optional)
    pub start_date: Option<String>,
    /// Inclusive end date YYYY-MM-DD (optional)
    pub end_date: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DailyValuesParams {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
    pub fiber: Option<f64>,
    /// Liters
    pub water: Option<f64>,
}

impl DailyValuesParams {
    fn into_values(self) -> DailyValues {
        DailyValues {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fats: self.fats,
            fiber: self.fiber,
            water: self.water,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SaveDailyNutritionParams {
    /// Date in YYYY-MM-DD format
    pub date: String,
    #[serde(flatten)]
    pub values: DailyValuesParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateDailyNutritionParams {
    pub id: i64,
    #[serde(flatten)]
    pub values: DailyValuesParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogRecipeParams {
    /// Date in YYYY-MM-DD format
    pub date: String,
    pub recipe_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogIngredientParams {
    /// Date in YYYY-MM-DD format
    pub date: String,
    pub ingredient_id: i64,
    pub quantity: f64,
    /// "grams" (default) or a custom unit id
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogManualNutritionParams {
    /// Date in YYYY-MM-DD format
    pub date: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default)]
    pub fiber: f64,
    /// Liters of water (optional)
    pub water: Option<f64>,
}

// ============================================================================
// Body Metrics Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BodyMetricsParams {
    /// kg
    pub weight: Option<f64>,
    /// Percent, 0-100
    pub body_fat: Option<f64>,
    /// kg
    pub muscle_mass: Option<f64>,
    pub visceral_fat: Option<f64>,
    pub bmi: Option<f64>,
    /// Percent, 0-100
    pub body_water: Option<f64>,
    /// kg
    pub bone_mass: Option<f64>,
    /// kcal/day
    pub basal_metabolism: Option<f64>,
    pub notes: Option<String>,
}

impl BodyMetricsParams {
    fn into_metrics(self) -> BodyMetrics {
        BodyMetrics {
            weight: self.weight,
            body_fat: self.body_fat,
            muscle_mass: self.muscle_mass,
            visceral_fat: self.visceral_fat,
            bmi: self.bmi,
            body_water: self.body_water,
            bone_mass: self.bone_mass,
            basal_metabolism: self.basal_metabolism,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SaveBodyMetricsParams {
    /// Date in YYYY-MM-DD format
    pub date: String,
    #[serde(flatten)]
    pub metrics: BodyMetricsParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateBodyMetricsParams {
    pub id: i64,
    #[serde(flatten)]
    pub metrics: BodyMetricsParams,
}

// ============================================================================
// Workout Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateExerciseParams {
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub video_url: Option<String>,
    /// chest, back, shoulders, arms, biceps, triceps, legs, quads, hamstrings, glutes, calves, core, abs
    #[serde(default)]
    pub muscles_involved: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListExercisesParams {
    /// Only exercises working this muscle (optional)
    pub muscle: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateExerciseParams {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub video_url: Option<String>,
    pub muscles_involved: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateWorkoutPlanParams {
    pub name: String,
    /// Date in YYYY-MM-DD format
    pub date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListWorkoutPlansParams {
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateWorkoutPlanParams {
    pub id: i64,
    pub name: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CopyWorkoutPlanParams {
    /// Plan to copy
    pub id: i64,
    /// Date for the copy; must not already have a plan
    pub target_date: String,
    /// Name for the copy (default "<name> (Copy)")
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddWorkoutEntryParams {
    pub plan_id: i64,
    pub exercise_id: i64,
    #[serde(default)]
    pub reps: i64,
    #[serde(default)]
    pub series: i64,
    /// kg
    #[serde(default)]
    pub weight: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateWorkoutEntryParams {
    pub id: i64,
    pub exercise_id: Option<i64>,
    pub reps: Option<i64>,
    pub series: Option<i64>,
    pub weight: Option<f64>,
}

// ============================================================================
// Habit Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateHabitParams {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateHabitParams {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ToggleHabitParams {
    pub habit_id: i64,
    /// Date in YYYY-MM-DD format
    pub date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListHabitsParams {
    /// Limit completions to a month, YYYY-MM (optional)
    pub month: Option<String>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl FitTrackService {
    // --- Status ---

    #[tool(description = "Get the current status of the FitTrack service including build info, database status, and process information")]
    async fn fittrack_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        json_result(&tracker.get_status(&self.database))
    }

    #[tool(description = "Get instructions for using FitTrack: per-gram ingredient values, custom units, recipes, and how daily logging adds up. Call this before logging food.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::USAGE_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(USAGE_INSTRUCTIONS)]))
    }

    // --- Ingredients ---

    #[tool(description = "Create an ingredient. Nutrition values are per gram.")]
    fn add_ingredient(&self, Parameters(p): Parameters<AddIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = IngredientCreate {
            name: p.name,
            per_gram: Nutrition { calories: p.calories, protein: p.protein, carbs: p.carbs, fats: p.fats, fiber: p.fiber },
        };
        let result = ingredients::add_ingredient(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get an ingredient with its custom units and recipe usage count")]
    fn get_ingredient(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::get_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Ingredient", p.id)
    }

    #[tool(description = "List all ingredients alphabetically")]
    fn list_ingredients(&self) -> Result<CallToolResult, McpError> {
        let result = ingredients::list_ingredients(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Search ingredients by name")]
    fn search_ingredients(&self, Parameters(p): Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::search_ingredients(&self.database, &p.query, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update an ingredient's name or per-gram nutrition")]
    fn update_ingredient(&self, Parameters(p): Parameters<UpdateIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = IngredientUpdate {
            name: p.name, calories: p.calories, protein: p.protein, carbs: p.carbs, fats: p.fats, fiber: p.fiber,
        };
        let result = ingredients::update_ingredient(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Ingredient", p.id)
    }

    #[tool(description = "Delete an ingredient and its custom units. Recipe lines using it remain and contribute nothing.")]
    fn delete_ingredient(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::delete_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Ingredient", p.id)
    }

    // --- Custom Units ---

    #[tool(description = "Define a custom unit for an ingredient, e.g. 1 cup = 240 grams")]
    fn add_custom_unit(&self, Parameters(p): Parameters<AddCustomUnitParams>) -> Result<CallToolResult, McpError> {
        let data = CustomUnitCreate { ingredient_id: p.ingredient_id, unit_name: p.unit_name, grams_equivalent: p.grams_equivalent };
        let result = ingredients::add_custom_unit(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List custom units, for one ingredient or all")]
    fn list_custom_units(&self, Parameters(p): Parameters<ListCustomUnitsParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::list_custom_units(&self.database, p.ingredient_id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a custom unit. Recipe lines using it are then read as grams.")]
    fn delete_custom_unit(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::delete_custom_unit(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Custom unit", p.id)
    }

    // --- Recipes ---

    #[tool(description = "Create a recipe with an optional scaling factor")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeCreate { name: p.name, instructions: p.instructions, scaling_factor: p.scaling_factor };
        let result = recipes::create_recipe(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a recipe with ordered lines, each line's nutrition contribution, and totals")]
    fn get_recipe(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Recipe", p.id)
    }

    #[tool(description = "List recipes with calorie totals")]
    fn list_recipes(&self, Parameters(p): Parameters<ListRecipesParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::list_recipes(&self.database, p.query.as_deref()).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a recipe's name, instructions or scaling factor")]
    fn update_recipe(&self, Parameters(p): Parameters<UpdateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeUpdate { name: p.name, instructions: p.instructions, scaling_factor: p.scaling_factor };
        let result = recipes::update_recipe(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Recipe", p.id)
    }

    #[tool(description = "Delete a recipe and all of its lines")]
    fn delete_recipe(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::delete_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Recipe", p.id)
    }

    #[tool(description = "Add an ingredient line to the end of a recipe")]
    fn add_recipe_ingredient(&self, Parameters(p): Parameters<AddRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeIngredientCreate {
            recipe_id: p.recipe_id,
            ingredient_id: p.ingredient_id,
            unit: parse_unit(p.unit.as_deref())?,
            quantity: p.quantity,
        };
        let result = recipes::add_recipe_ingredient(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Change a recipe line's quantity or unit")]
    fn update_recipe_ingredient(&self, Parameters(p): Parameters<UpdateRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let unit = match p.unit.as_deref() {
            Some(u) => Some(parse_unit(Some(u))?),
            None => None,
        };
        let data = RecipeIngredientUpdate { quantity: p.quantity, unit };
        let result = recipes::update_recipe_ingredient(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Recipe line", p.id)
    }

    #[tool(description = "Remove a line from a recipe")]
    fn remove_recipe_ingredient(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::remove_recipe_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Recipe line", p.id)
    }

    #[tool(description = "Reorder a recipe's lines. Pass every line ID in the new order.")]
    fn reorder_recipe_ingredients(&self, Parameters(p): Parameters<ReorderRecipeIngredientsParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::reorder_recipe_ingredients(&self.database, p.recipe_id, p.line_ids).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Daily Nutrition ---

    #[tool(description = "Get the nutrition record for a date")]
    fn get_daily_nutrition(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        let result = daily::get_daily_nutrition(&self.database, &p.date).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Daily nutrition", &p.date)
    }

    #[tool(description = "List daily nutrition records, newest first, optionally within a date range")]
    fn list_daily_nutrition(&self, Parameters(p): Parameters<DateRangeParams>) -> Result<CallToolResult, McpError> {
        let result = daily::list_daily_nutrition(&self.database, p.start_date.as_deref(), p.end_date.as_deref(), p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Set nutrition values for a date outright (replaces the provided fields, does not add)")]
    fn save_daily_nutrition(&self, Parameters(p): Parameters<SaveDailyNutritionParams>) -> Result<CallToolResult, McpError> {
        let result = daily::save_daily_nutrition(&self.database, &p.date, p.values.into_values()).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Set nutrition values on a daily record by ID")]
    fn update_daily_nutrition(&self, Parameters(p): Parameters<UpdateDailyNutritionParams>) -> Result<CallToolResult, McpError> {
        let result = daily::update_daily_nutrition(&self.database, p.id, p.values.into_values()).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Daily nutrition", p.id)
    }

    #[tool(description = "Delete a daily nutrition record")]
    fn delete_daily_nutrition(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = daily::delete_daily_nutrition(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Daily nutrition", p.id)
    }

    #[tool(description = "Add a full recipe's nutrition to a date. Additive: logging twice counts twice.")]
    fn log_recipe(&self, Parameters(p): Parameters<LogRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = daily::log_recipe(&self.database, &p.date, p.recipe_id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Add a quantity of an ingredient (grams or a custom unit) to a date")]
    fn log_ingredient(&self, Parameters(p): Parameters<LogIngredientParams>) -> Result<CallToolResult, McpError> {
        let unit = parse_unit(p.unit.as_deref())?;
        let result = daily::log_ingredient(&self.database, &p.date, p.ingredient_id, p.quantity, unit).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Add raw nutrition values and/or water (liters) to a date")]
    fn log_manual_nutrition(&self, Parameters(p): Parameters<LogManualNutritionParams>) -> Result<CallToolResult, McpError> {
        let nutrition = Nutrition { calories: p.calories, protein: p.protein, carbs: p.carbs, fats: p.fats, fiber: p.fiber };
        let result = daily::log_manual_nutrition(&self.database, &p.date, nutrition, p.water).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Body Metrics ---

    #[tool(description = "Save body metrics for a date (sets the provided readings)")]
    fn save_body_metrics(&self, Parameters(p): Parameters<SaveBodyMetricsParams>) -> Result<CallToolResult, McpError> {
        let result = body_metrics::save_body_metrics(&self.database, &p.date, p.metrics.into_metrics()).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get body metrics for a date")]
    fn get_body_metrics(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        let result = body_metrics::get_body_metrics(&self.database, &p.date).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Body metrics", &p.date)
    }

    #[tool(description = "List body metrics, newest first, optionally within a date range")]
    fn list_body_metrics(&self, Parameters(p): Parameters<DateRangeParams>) -> Result<CallToolResult, McpError> {
        let result = body_metrics::list_body_metrics(&self.database, p.start_date.as_deref(), p.end_date.as_deref(), p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update body metrics by ID")]
    fn update_body_metrics(&self, Parameters(p): Parameters<UpdateBodyMetricsParams>) -> Result<CallToolResult, McpError> {
        let result = body_metrics::update_body_metrics(&self.database, p.id, p.metrics.into_metrics()).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Body metrics", p.id)
    }

    #[tool(description = "Delete body metrics by ID")]
    fn delete_body_metrics(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = body_metrics::delete_body_metrics(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Body metrics", p.id)
    }

    // --- Exercises ---

    #[tool(description = "Add an exercise to the library")]
    fn create_exercise(&self, Parameters(p): Parameters<CreateExerciseParams>) -> Result<CallToolResult, McpError> {
        let data = ExerciseCreate {
            name: p.name,
            description: p.description,
            photo_url: p.photo_url,
            video_url: p.video_url,
            muscles_involved: parse_muscle_list(&p.muscles_involved)?,
        };
        let result = workouts::create_exercise(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get an exercise")]
    fn get_exercise(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = workouts::get_exercise(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Exercise", p.id)
    }

    #[tool(description = "List exercises, optionally filtered by muscle")]
    fn list_exercises(&self, Parameters(p): Parameters<ListExercisesParams>) -> Result<CallToolResult, McpError> {
        let muscle = match p.muscle.as_deref() {
            Some(m) => parse_muscle_list(&[m.to_string()])?.into_iter().next(),
            None => None,
        };
        let result = workouts::list_exercises(&self.database, muscle).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update an exercise")]
    fn update_exercise(&self, Parameters(p): Parameters<UpdateExerciseParams>) -> Result<CallToolResult, McpError> {
        let muscles_involved = match p.muscles_involved {
            Some(names) => Some(parse_muscle_list(&names)?),
            None => None,
        };
        let data = ExerciseUpdate {
            name: p.name, description: p.description, photo_url: p.photo_url, video_url: p.video_url, muscles_involved,
        };
        let result = workouts::update_exercise(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Exercise", p.id)
    }

    #[tool(description = "Delete an exercise that is not used by any workout plan")]
    fn delete_exercise(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = workouts::delete_exercise(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Exercise", p.id)
    }

    // --- Workout Plans ---

    #[tool(description = "Create a workout plan for a date")]
    fn create_workout_plan(&self, Parameters(p): Parameters<CreateWorkoutPlanParams>) -> Result<CallToolResult, McpError> {
        let result = workouts::create_workout_plan(&self.database, &p.name, &p.date).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a workout plan with its exercises")]
    fn get_workout_plan(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = workouts::get_workout_plan(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Workout plan", p.id)
    }

    #[tool(description = "Get the workout plan scheduled on a date")]
    fn get_workout_plan_by_date(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        let result = workouts::get_workout_plan_by_date(&self.database, &p.date).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Workout plan", &p.date)
    }

    #[tool(description = "List workout plans, newest date first")]
    fn list_workout_plans(&self, Parameters(p): Parameters<ListWorkoutPlansParams>) -> Result<CallToolResult, McpError> {
        let result = workouts::list_workout_plans(&self.database, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Rename or reschedule a workout plan")]
    fn update_workout_plan(&self, Parameters(p): Parameters<UpdateWorkoutPlanParams>) -> Result<CallToolResult, McpError> {
        let data = WorkoutPlanUpdate { name: p.name, date: p.date };
        let result = workouts::update_workout_plan(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Workout plan", p.id)
    }

    #[tool(description = "Delete a workout plan and its exercises")]
    fn delete_workout_plan(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = workouts::delete_workout_plan(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Workout plan", p.id)
    }

    #[tool(description = "Copy a workout plan to another date. Fails if that date already has a plan.")]
    fn copy_workout_plan(&self, Parameters(p): Parameters<CopyWorkoutPlanParams>) -> Result<CallToolResult, McpError> {
        let result = workouts::copy_workout_plan(&self.database, p.id, &p.target_date, p.name.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Add an exercise entry (reps, series, weight) to a workout plan")]
    fn add_workout_entry(&self, Parameters(p): Parameters<AddWorkoutEntryParams>) -> Result<CallToolResult, McpError> {
        let data = WorkoutEntryCreate { plan_id: p.plan_id, exercise_id: p.exercise_id, reps: p.reps, series: p.series, weight: p.weight };
        let result = workouts::add_workout_entry(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a workout entry")]
    fn update_workout_entry(&self, Parameters(p): Parameters<UpdateWorkoutEntryParams>) -> Result<CallToolResult, McpError> {
        let data = WorkoutEntryUpdate { exercise_id: p.exercise_id, reps: p.reps, series: p.series, weight: p.weight };
        let result = workouts::update_workout_entry(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Workout entry", p.id)
    }

    #[tool(description = "Remove an entry from a workout plan")]
    fn remove_workout_entry(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = workouts::remove_workout_entry(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Workout entry", p.id)
    }

    // --- Habits ---

    #[tool(description = "Create a habit")]
    fn create_habit(&self, Parameters(p): Parameters<CreateHabitParams>) -> Result<CallToolResult, McpError> {
        let result = habits::create_habit(&self.database, &p.name, p.description).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a habit with all its completions")]
    fn get_habit(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = habits::get_habit(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Habit", p.id)
    }

    #[tool(description = "List habits with completions, optionally for one month (YYYY-MM)")]
    fn list_habits(&self, Parameters(p): Parameters<ListHabitsParams>) -> Result<CallToolResult, McpError> {
        let result = habits::list_habits(&self.database, p.month.as_deref()).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Rename a habit or change its description")]
    fn update_habit(&self, Parameters(p): Parameters<UpdateHabitParams>) -> Result<CallToolResult, McpError> {
        let data = HabitUpdate { name: p.name, description: p.description };
        let result = habits::update_habit(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Habit", p.id)
    }

    #[tool(description = "Delete a habit and its completion history")]
    fn delete_habit(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = habits::delete_habit(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_or_not_found(result, "Habit", p.id)
    }

    #[tool(description = "Mark a habit done for a date, or undo it if it was already done")]
    fn toggle_habit(&self, Parameters(p): Parameters<ToggleHabitParams>) -> Result<CallToolResult, McpError> {
        let result = habits::toggle_habit(&self.database, p.habit_id, &p.date).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

#[tool_handler]
impl ServerHandler for FitTrackService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "fittrack".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("FitTrack".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "FitTrack - nutrition, workout and habit tracking. \
                 IMPORTANT: Call usage_instructions before logging food; ingredient values are per gram. \
                 Ingredients: add/get/list/search/update/delete_ingredient, add/list/delete_custom_unit. \
                 Recipes: create/get/list/update/delete_recipe, add/update/remove_recipe_ingredient, reorder_recipe_ingredients. \
                 Daily: get/list/save/update/delete_daily_nutrition; log_recipe, log_ingredient, log_manual_nutrition add to a day. \
                 Body: save/get/list/update/delete_body_metrics. \
                 Workouts: create/get/list/update/delete_exercise, create/get/list/update/delete_workout_plan, \
                 get_workout_plan_by_date, copy_workout_plan, add/update/remove_workout_entry. \
                 Habits: create/get/list/update/delete_habit, toggle_habit."
                    .into(),
            ),
        }
    }
}
