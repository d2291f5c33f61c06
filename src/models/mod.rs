//! Data models
//!
//! Rust structs representing database entities.

mod custom_unit;
mod daily_body_metrics;
mod daily_nutrition;
mod exercise;
mod habit;
mod ingredient;
mod nutrition;
mod recipe;
mod recipe_ingredient;
mod workout_plan;

pub use custom_unit::{CustomUnit, CustomUnitCreate};
pub use daily_body_metrics::{BodyMetrics, DailyBodyMetrics};
pub use daily_nutrition::{DailyNutrition, DailyValues};
pub use exercise::{Exercise, ExerciseCreate, ExerciseUpdate, Muscle};
pub use habit::{Habit, HabitCompletion, HabitCreate, HabitUpdate};
pub use ingredient::{Ingredient, IngredientCreate, IngredientUpdate};
pub use nutrition::Nutrition;
pub use recipe::{Recipe, RecipeCreate, RecipeUpdate};
pub use recipe_ingredient::{RecipeIngredient, RecipeIngredientCreate, RecipeIngredientUpdate};
pub use workout_plan::{
    WorkoutEntry, WorkoutEntryCreate, WorkoutEntryDetail, WorkoutEntryUpdate, WorkoutPlan,
    WorkoutPlanCreate, WorkoutPlanUpdate,
};
