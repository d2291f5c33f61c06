//! Daily merge-on-write
//!
//! Logging food adds to the date's record; it never replaces it. Two
//! identical additions double the total.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::coerce::round2;
use crate::db::DbResult;
use crate::models::{DailyNutrition, DailyValues, Nutrition};

/// Something eaten or drunk, to be added to a day
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub nutrition: Nutrition,
    /// Only manual entries carry water
    pub water: Option<f64>,
}

impl Contribution {
    pub fn food(nutrition: Nutrition) -> Self {
        Self { nutrition, water: None }
    }
}

/// Add `contribution` to `existing` field by field.
///
/// Missing fields count as zero. A zero addend leaves its field exactly as it
/// was (including unset), and water is only touched when the contribution
/// carries some.
pub fn merge_contribution(existing: &DailyValues, contribution: &Contribution) -> DailyValues {
    fn merge(current: Option<f64>, addend: f64) -> Option<f64> {
        if addend == 0.0 || !addend.is_finite() {
            return current;
        }
        Some(round2(current.unwrap_or(0.0) + addend))
    }

    let n = &contribution.nutrition;
    DailyValues {
        calories: merge(existing.calories, n.calories),
        protein: merge(existing.protein, n.protein),
        carbs: merge(existing.carbs, n.carbs),
        fats: merge(existing.fats, n.fats),
        fiber: merge(existing.fiber, n.fiber),
        water: match contribution.water {
            Some(water) => merge(existing.water, water),
            None => existing.water,
        },
    }
}

/// Read the date's record, merge, and upsert it.
///
/// This read-modify-write holds no lock. Two concurrent calls for the same
/// date can both read the old totals and one addition is lost.
pub fn log_contribution(conn: &Connection, date: &str, contribution: &Contribution) -> DbResult<DailyNutrition> {
    let existing = DailyNutrition::get_by_date(conn, date)?
        .map(|day| day.values)
        .unwrap_or_default();

    let merged = merge_contribution(&existing, contribution);
    debug!(date, calories = ?merged.calories, "Merged daily nutrition");

    DailyNutrition::put(conn, date, &merged)
}
