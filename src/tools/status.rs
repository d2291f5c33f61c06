//! FitTrack Status Tool
//!
//! Runtime status and usage guidance for MCP clients.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::Database;

/// How-to guide returned by the `usage_instructions` tool
pub const USAGE_INSTRUCTIONS: &str = r#"
# FitTrack Usage Instructions

## Ingredients

Ingredient nutrition is stored **per gram**. Convert label values before saving:

| Label says | Store |
|------------|-------|
| 389 kcal per 100 g | `calories: 3.89` |
| 13.2 g protein per 100 g | `protein: 0.132` |

Fields: `calories`, `protein`, `carbs`, `fats`, `fiber`. All must be 0 or greater.

### Custom units

A custom unit says how many grams one "unit" of an ingredient weighs
(`add_custom_unit` with `unit_name: "cup", grams_equivalent: 240`). Units belong
to one ingredient and are deleted with it.

## Recipes

1. `create_recipe` (optionally with `scaling_factor`, default 1)
2. `add_recipe_ingredient` for each line. `unit` is `"grams"` or a custom unit id.
3. `get_recipe` shows every line's contribution and the totals.

Totals = sum over lines of (grams x per-gram value), multiplied by the scaling
factor and rounded to 2 decimals. A scaling factor of 0 or less counts as 1.

Lines whose ingredient was deleted stay in the recipe and contribute nothing.

## Logging food for a day

Dates are `YYYY-MM-DD`. Logging **adds** to the day; it never replaces it.

- `log_recipe` - add one full recipe
- `log_ingredient` - add a quantity of an ingredient
- `log_manual_nutrition` - add raw numbers, including `water` (liters)

Logging the same recipe twice counts it twice. Use `save_daily_nutrition` to set
values outright instead of adding.

## Body metrics, workouts and habits

- `save_body_metrics` sets the provided readings for a date. `body_fat` and
  `body_water` are percentages (0-100).
- `create_workout_plan` + `add_workout_entry` (reps, series, weight in kg).
  `copy_workout_plan` repeats a plan on another date that has no plan yet.
- `toggle_habit` marks a habit done for a date; calling it again un-marks it.
"#;

/// Status information
#[derive(Debug, Clone, Serialize)]
pub struct FitTrackStatus {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub schema_version: Option<i32>,
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Tracks process start time for uptime
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> FitTrackStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let schema_version = db
            .with_conn(crate::db::migrations::get_schema_version)
            .ok();

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        FitTrackStatus {
            name: build_info.name,
            version: build_info.version,
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            schema_version,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_schema_version() {
        let db = Database::in_memory().unwrap();
        let tracker = StatusTracker::new(PathBuf::from(":memory:"));
        let status = tracker.get_status(&db);

        assert_eq!(status.schema_version, Some(crate::db::migrations::SCHEMA_VERSION));
        assert_eq!(status.process_id, std::process::id());
        assert!(status.database_size_bytes.is_none());
    }
}
