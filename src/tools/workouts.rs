//! Workout MCP Tools
//!
//! Tools for the exercise library and dated workout plans.

use serde::Serialize;
use tracing::info;

use crate::db::{Database, DbError};
use crate::models::{
    Exercise, ExerciseCreate, ExerciseUpdate, Muscle, WorkoutEntry, WorkoutEntryCreate,
    WorkoutEntryDetail, WorkoutEntryUpdate, WorkoutPlan, WorkoutPlanCreate, WorkoutPlanUpdate,
};
use super::{require_name, validate_date, DeleteResponse};

#[derive(Debug, Serialize)]
pub struct ListExercisesResponse {
    pub exercises: Vec<Exercise>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct WorkoutPlanDetail {
    #[serde(flatten)]
    pub plan: WorkoutPlan,
    pub entries: Vec<WorkoutEntryDetail>,
}

#[derive(Debug, Serialize)]
pub struct WorkoutPlanSummary {
    pub id: i64,
    pub name: String,
    pub date: String,
    pub entry_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ListWorkoutPlansResponse {
    pub plans: Vec<WorkoutPlanSummary>,
    pub count: usize,
}

/// Parse muscle names, rejecting anything outside the vocabulary
pub fn parse_muscles(names: &[String]) -> Result<Vec<Muscle>, String> {
    names
        .iter()
        .map(|name| {
            Muscle::from_str(name).ok_or_else(|| {
                let valid: Vec<&str> = Muscle::ALL.iter().map(|m| m.as_str()).collect();
                format!("Unknown muscle '{}'. Valid: {}", name, valid.join(", "))
            })
        })
        .collect()
}

fn check_entry(reps: Option<i64>, series: Option<i64>, weight: Option<f64>) -> Result<(), String> {
    if reps.is_some_and(|r| r < 0) {
        return Err("reps must be 0 or greater".to_string());
    }
    if series.is_some_and(|s| s < 0) {
        return Err("series must be 0 or greater".to_string());
    }
    if weight.is_some_and(|w| !w.is_finite() || w < 0.0) {
        return Err("weight must be 0 or greater".to_string());
    }
    Ok(())
}

// ============================================================================
// Exercise Library Tools
// ============================================================================

pub fn create_exercise(db: &Database, data: ExerciseCreate) -> Result<Exercise, String> {
    let name = require_name(&data.name, "Exercise")?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Exercise::create(&conn, &ExerciseCreate { name, ..data })
        .map_err(|e| format!("Failed to create exercise: {}", e))
}

pub fn get_exercise(db: &Database, id: i64) -> Result<Option<Exercise>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Exercise::get_by_id(&conn, id).map_err(|e| format!("Failed to get exercise: {}", e))
}

/// List exercises, optionally only those working one muscle
pub fn list_exercises(db: &Database, muscle: Option<Muscle>) -> Result<ListExercisesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let exercises = Exercise::list(&conn, muscle)
        .map_err(|e| format!("Failed to list exercises: {}", e))?;

    Ok(ListExercisesResponse {
        count: exercises.len(),
        exercises,
    })
}

pub fn update_exercise(db: &Database, id: i64, data: ExerciseUpdate) -> Result<Option<Exercise>, String> {
    let name = data
        .name
        .as_deref()
        .map(|n| require_name(n, "Exercise"))
        .transpose()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Exercise::update(&conn, id, &ExerciseUpdate { name, ..data })
        .map_err(|e| format!("Failed to update exercise: {}", e))
}

/// Delete an exercise that no workout plan uses
pub fn delete_exercise(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let usage = Exercise::count_workout_entries(&conn, id)
        .map_err(|e| format!("Failed to check exercise usage: {}", e))?;
    if usage > 0 {
        return Err(format!(
            "Exercise {} is used in {} workout entries; remove those first",
            id, usage
        ));
    }

    let deleted = Exercise::delete(&conn, id)
        .map_err(|e| format!("Failed to delete exercise: {}", e))?;

    Ok(deleted.then_some(DeleteResponse {
        success: true,
        deleted_id: id,
    }))
}

// ============================================================================
// Workout Plan Tools
// ============================================================================

pub fn create_workout_plan(db: &Database, name: &str, date: &str) -> Result<WorkoutPlan, String> {
    let name = require_name(name, "Workout plan")?;
    let date = validate_date(date)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plan = WorkoutPlan::create(&conn, &WorkoutPlanCreate { name, date })
        .map_err(|e| format!("Failed to create workout plan: {}", e))?;

    info!("Created workout plan {} for {}", plan.id, plan.date);
    Ok(plan)
}

fn plan_detail(conn: &rusqlite::Connection, plan: WorkoutPlan) -> Result<WorkoutPlanDetail, String> {
    let entries = WorkoutEntry::get_details_for_plan(conn, plan.id)
        .map_err(|e| format!("Failed to get workout entries: {}", e))?;
    Ok(WorkoutPlanDetail { plan, entries })
}

pub fn get_workout_plan(db: &Database, id: i64) -> Result<Option<WorkoutPlanDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    WorkoutPlan::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get workout plan: {}", e))?
        .map(|plan| plan_detail(&conn, plan))
        .transpose()
}

pub fn get_workout_plan_by_date(db: &Database, date: &str) -> Result<Option<WorkoutPlanDetail>, String> {
    let date = validate_date(date)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    WorkoutPlan::get_by_date(&conn, &date)
        .map_err(|e| format!("Failed to get workout plan: {}", e))?
        .map(|plan| plan_detail(&conn, plan))
        .transpose()
}

/// List plans, newest date first
pub fn list_workout_plans(db: &Database, limit: i64) -> Result<ListWorkoutPlansResponse, String> {
    let limit = limit.clamp(1, 200);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plans = WorkoutPlan::list(&conn, limit)
        .map_err(|e| format!("Failed to list workout plans: {}", e))?;

    let mut summaries = Vec::with_capacity(plans.len());
    for plan in plans {
        let entry_count = WorkoutEntry::get_details_for_plan(&conn, plan.id)
            .map_err(|e| format!("Failed to get workout entries: {}", e))?
            .len();
        summaries.push(WorkoutPlanSummary {
            id: plan.id,
            name: plan.name,
            date: plan.date,
            entry_count,
        });
    }

    Ok(ListWorkoutPlansResponse {
        count: summaries.len(),
        plans: summaries,
    })
}

pub fn update_workout_plan(db: &Database, id: i64, data: WorkoutPlanUpdate) -> Result<Option<WorkoutPlan>, String> {
    let name = data
        .name
        .as_deref()
        .map(|n| require_name(n, "Workout plan"))
        .transpose()?;
    let date = data.date.as_deref().map(validate_date).transpose()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    WorkoutPlan::update(&conn, id, &WorkoutPlanUpdate { name, date })
        .map_err(|e| format!("Failed to update workout plan: {}", e))
}

/// Delete a plan and its entries
pub fn delete_workout_plan(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let deleted = db
        .transaction(|tx| WorkoutPlan::delete(tx, id))
        .map_err(|e| format!("Failed to delete workout plan: {}", e))?;

    Ok(deleted.then_some(DeleteResponse {
        success: true,
        deleted_id: id,
    }))
}

/// Copy a plan to another date that has no plan yet
pub fn copy_workout_plan(
    db: &Database,
    source_id: i64,
    target_date: &str,
    name: Option<&str>,
) -> Result<WorkoutPlanDetail, String> {
    let target_date = validate_date(target_date)?;
    let name = name.map(|n| require_name(n, "Workout plan")).transpose()?;

    let copy = db
        .transaction(|tx| WorkoutPlan::copy_to_date(tx, source_id, &target_date, name.as_deref()))
        .map_err(|e| match e {
            DbError::Conflict(msg) => format!("Cannot copy workout plan: {}", msg),
            other => format!("Failed to copy workout plan: {}", other),
        })?;

    info!("Copied workout plan {} to {} as {}", source_id, target_date, copy.id);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    plan_detail(&conn, copy)
}

// ============================================================================
// Workout Entry Tools
// ============================================================================

pub fn add_workout_entry(db: &Database, data: WorkoutEntryCreate) -> Result<WorkoutEntry, String> {
    check_entry(Some(data.reps), Some(data.series), Some(data.weight))?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    WorkoutPlan::get_by_id(&conn, data.plan_id)
        .map_err(|e| format!("Failed to get workout plan: {}", e))?
        .ok_or_else(|| format!("Workout plan not found with id: {}", data.plan_id))?;
    Exercise::get_by_id(&conn, data.exercise_id)
        .map_err(|e| format!("Failed to get exercise: {}", e))?
        .ok_or_else(|| format!("Exercise not found with id: {}", data.exercise_id))?;

    WorkoutEntry::create(&conn, &data).map_err(|e| format!("Failed to add workout entry: {}", e))
}

pub fn update_workout_entry(db: &Database, id: i64, data: WorkoutEntryUpdate) -> Result<Option<WorkoutEntry>, String> {
    check_entry(data.reps, data.series, data.weight)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if let Some(exercise_id) = data.exercise_id {
        Exercise::get_by_id(&conn, exercise_id)
            .map_err(|e| format!("Failed to get exercise: {}", e))?
            .ok_or_else(|| format!("Exercise not found with id: {}", exercise_id))?;
    }

    WorkoutEntry::update(&conn, id, &data).map_err(|e| format!("Failed to update workout entry: {}", e))
}

pub fn remove_workout_entry(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = WorkoutEntry::delete(&conn, id)
        .map_err(|e| format!("Failed to remove workout entry: {}", e))?;

    Ok(deleted.then_some(DeleteResponse {
        success: true,
        deleted_id: id,
    }))
}
