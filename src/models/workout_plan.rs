//! Workout plan model
//!
//! A named plan for a date, holding exercise entries (reps x series at a weight).

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::coerce::f64_or_zero;
use crate::db::{DbError, DbResult};
use super::{Exercise, Muscle};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: i64,
    pub name: String,
    pub date: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One exercise within a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub id: i64,
    pub plan_id: i64,
    pub exercise_id: i64,
    pub reps: i64,
    pub series: i64,
    pub weight: f64, // kg
}

/// Entry joined with the exercise it refers to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutEntryDetail {
    pub id: i64,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub muscles_involved: Vec<Muscle>,
    pub reps: i64,
    pub series: i64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutPlanCreate {
    pub name: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkoutPlanUpdate {
    pub name: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutEntryCreate {
    pub plan_id: i64,
    pub exercise_id: i64,
    pub reps: i64,
    pub series: i64,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkoutEntryUpdate {
    pub exercise_id: Option<i64>,
    pub reps: Option<i64>,
    pub series: Option<i64>,
    pub weight: Option<f64>,
}

impl WorkoutPlan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            date: row.get("date")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(conn: &Connection, data: &WorkoutPlanCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO workout_plans (name, date) VALUES (?1, ?2)",
            params![data.name, data.date],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Workout plan", id))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM workout_plans WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// First plan scheduled on `date`
    pub fn get_by_date(conn: &Connection, date: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM workout_plans WHERE date = ?1 ORDER BY id LIMIT 1")?;

        let result = stmt.query_row([date], Self::from_row);
        match result {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List plans, newest date first
    pub fn list(conn: &Connection, limit: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM workout_plans ORDER BY date DESC, id DESC LIMIT ?1")?;
        let plans = stmt
            .query_map([limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(plans)
    }

    pub fn update(conn: &Connection, id: i64, data: &WorkoutPlanUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref date) = data.date {
            updates.push(format!("date = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(date.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE workout_plans SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a plan and its entries. Expects to run inside a transaction.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        conn.execute("DELETE FROM workout_exercises WHERE plan_id = ?1", [id])?;
        let rows = conn.execute("DELETE FROM workout_plans WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Copy a plan and its entries to `target_date`.
    ///
    /// Fails with `Conflict` when a plan already exists on that date. Expects
    /// to run inside a transaction.
    pub fn copy_to_date(
        conn: &Connection,
        source_id: i64,
        target_date: &str,
        name: Option<&str>,
    ) -> DbResult<Self> {
        let source = Self::get_by_id(conn, source_id)?.ok_or(DbError::NotFound("Workout plan", source_id))?;

        if let Some(existing) = Self::get_by_date(conn, target_date)? {
            return Err(DbError::Conflict(format!(
                "a workout plan already exists on {} (id {})",
                target_date, existing.id
            )));
        }

        let default_name = format!("{} (Copy)", source.name);
        let copy = Self::create(
            conn,
            &WorkoutPlanCreate {
                name: name.map(str::to_string).unwrap_or(default_name),
                date: target_date.to_string(),
            },
        )?;

        conn.execute(
            r#"
            INSERT INTO workout_exercises (plan_id, exercise_id, reps, series, weight)
            SELECT ?1, exercise_id, reps, series, weight
            FROM workout_exercises WHERE plan_id = ?2 ORDER BY id
            "#,
            params![copy.id, source_id],
        )?;

        Ok(copy)
    }
}

impl WorkoutEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            plan_id: row.get("plan_id")?,
            exercise_id: row.get("exercise_id")?,
            reps: row.get("reps")?,
            series: row.get("series")?,
            weight: f64_or_zero(row, "weight")?,
        })
    }

    pub fn create(conn: &Connection, data: &WorkoutEntryCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO workout_exercises (plan_id, exercise_id, reps, series, weight)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![data.plan_id, data.exercise_id, data.reps, data.series, data.weight],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Workout entry", id))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM workout_exercises WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Entries for a plan with exercise details, in insertion order
    pub fn get_details_for_plan(conn: &Connection, plan_id: i64) -> DbResult<Vec<WorkoutEntryDetail>> {
        let mut stmt = conn.prepare("SELECT * FROM workout_exercises WHERE plan_id = ?1 ORDER BY id")?;
        let entries = stmt
            .query_map([plan_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut details = Vec::with_capacity(entries.len());
        for entry in entries {
            let exercise = Exercise::get_by_id(conn, entry.exercise_id)?;
            let (exercise_name, muscles_involved) = match exercise {
                Some(e) => (e.name, e.muscles_involved),
                None => ("(deleted exercise)".to_string(), Vec::new()),
            };
            details.push(WorkoutEntryDetail {
                id: entry.id,
                exercise_id: entry.exercise_id,
                exercise_name,
                muscles_involved,
                reps: entry.reps,
                series: entry.series,
                weight: entry.weight,
            });
        }

        Ok(details)
    }

    pub fn update(conn: &Connection, id: i64, data: &WorkoutEntryUpdate) -> DbResult<Option<Self>> {
        let Some(current) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        conn.execute(
            "UPDATE workout_exercises SET exercise_id = ?1, reps = ?2, series = ?3, weight = ?4 WHERE id = ?5",
            params![
                data.exercise_id.unwrap_or(current.exercise_id),
                data.reps.unwrap_or(current.reps),
                data.series.unwrap_or(current.series),
                data.weight.unwrap_or(current.weight),
                id,
            ],
        )?;

        Self::get_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM workout_exercises WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::ExerciseCreate;

    fn seed_plan(conn: &Connection) -> DbResult<WorkoutPlan> {
        let press = Exercise::create(
            conn,
            &ExerciseCreate { name: "Overhead Press".into(), muscles_involved: vec![Muscle::Shoulders], ..Default::default() },
        )?;
        let plan = WorkoutPlan::create(conn, &WorkoutPlanCreate { name: "Push".into(), date: "2025-05-01".into() })?;
        WorkoutEntry::create(
            conn,
            &WorkoutEntryCreate { plan_id: plan.id, exercise_id: press.id, reps: 8, series: 4, weight: 40.0 },
        )?;
        Ok(plan)
    }

    #[test]
    fn test_copy_to_date_duplicates_entries() {
        let db = Database::in_memory().unwrap();
        let (copy, details) = db
            .transaction(|tx| {
                let plan = seed_plan(tx)?;
                let copy = WorkoutPlan::copy_to_date(tx, plan.id, "2025-05-08", None)?;
                let details = WorkoutEntry::get_details_for_plan(tx, copy.id)?;
                Ok((copy, details))
            })
            .unwrap();

        assert_eq!(copy.name, "Push (Copy)");
        assert_eq!(copy.date, "2025-05-08");
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].exercise_name, "Overhead Press");
        assert_eq!(details[0].reps, 8);
        assert_eq!(details[0].weight, 40.0);
    }

    #[test]
    fn test_copy_to_occupied_date_conflicts() {
        let db = Database::in_memory().unwrap();
        let result = db.transaction(|tx| {
            let plan = seed_plan(tx)?;
            WorkoutPlan::create(tx, &WorkoutPlanCreate { name: "Legs".into(), date: "2025-05-08".into() })?;
            WorkoutPlan::copy_to_date(tx, plan.id, "2025-05-08", Some("Push again"))
        });
        assert!(matches!(result, Err(DbError::Conflict(_))));
    }

    #[test]
    fn test_delete_removes_entries() {
        let db = Database::in_memory().unwrap();
        db.transaction(|tx| {
            let plan = seed_plan(tx)?;
            assert!(WorkoutPlan::delete(tx, plan.id)?);
            let remaining: i64 = tx.query_row("SELECT COUNT(*) FROM workout_exercises", [], |r| r.get(0))?;
            assert_eq!(remaining, 0);
            Ok(())
        })
        .unwrap();
    }
}
