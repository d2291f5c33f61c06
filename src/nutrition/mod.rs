//! Nutrition calculation module
//!
//! Handles unit resolution, recipe aggregation and daily merging.

pub mod aggregate;
pub mod daily;
pub mod units;

pub use aggregate::{
    accumulate, effective_scaling_factor, grams_for_line, line_contribution, line_nutrition,
    recipe_totals, Line, NutritionLookup,
};
pub use daily::{log_contribution, merge_contribution, Contribution};
pub use units::UnitRef;
