//! Habit MCP Tools

use serde::Serialize;

use crate::db::Database;
use crate::models::{Habit, HabitCompletion, HabitCreate, HabitUpdate};
use super::{require_name, validate_date, validate_month, DeleteResponse};

/// A habit with its completion records
#[derive(Debug, Serialize)]
pub struct HabitWithCompletions {
    #[serde(flatten)]
    pub habit: Habit,
    pub completions: Vec<HabitCompletion>,
    pub completed_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ListHabitsResponse {
    pub month: Option<String>,
    pub habits: Vec<HabitWithCompletions>,
    pub count: usize,
}

pub fn create_habit(db: &Database, name: &str, description: Option<String>) -> Result<Habit, String> {
    let name = require_name(name, "Habit")?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Habit::create(&conn, &HabitCreate { name, description })
        .map_err(|e| format!("Failed to create habit: {}", e))
}

pub fn get_habit(db: &Database, id: i64) -> Result<Option<HabitWithCompletions>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(habit) = Habit::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get habit: {}", e))?
    else {
        return Ok(None);
    };

    let completions = HabitCompletion::list_for_habit(&conn, id, None)
        .map_err(|e| format!("Failed to list completions: {}", e))?;

    Ok(Some(HabitWithCompletions {
        completed_count: completions.iter().filter(|c| c.completed).count(),
        habit,
        completions,
    }))
}

pub fn update_habit(db: &Database, id: i64, data: HabitUpdate) -> Result<Option<Habit>, String> {
    let name = data
        .name
        .as_deref()
        .map(|n| require_name(n, "Habit"))
        .transpose()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Habit::update(&conn, id, &HabitUpdate { name, ..data })
        .map_err(|e| format!("Failed to update habit: {}", e))
}

/// Delete a habit and all of its completions
pub fn delete_habit(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let deleted = db
        .transaction(|tx| Habit::delete(tx, id))
        .map_err(|e| format!("Failed to delete habit: {}", e))?;

    Ok(deleted.then_some(DeleteResponse {
        success: true,
        deleted_id: id,
    }))
}

/// Mark a habit done for a date, or undo it if already done
pub fn toggle_habit(db: &Database, habit_id: i64, date: &str) -> Result<HabitCompletion, String> {
    let date = validate_date(date)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Habit::get_by_id(&conn, habit_id)
        .map_err(|e| format!("Failed to get habit: {}", e))?
        .ok_or_else(|| format!("Habit not found with id: {}", habit_id))?;

    HabitCompletion::toggle(&conn, habit_id, &date)
        .map_err(|e| format!("Failed to toggle habit: {}", e))
}

/// List habits with completions, optionally for one month (YYYY-MM)
pub fn list_habits(db: &Database, month: Option<&str>) -> Result<ListHabitsResponse, String> {
    let month = month.map(validate_month).transpose()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let habits = Habit::list(&conn).map_err(|e| format!("Failed to list habits: {}", e))?;

    let mut out = Vec::with_capacity(habits.len());
    for habit in habits {
        let completions = HabitCompletion::list_for_habit(&conn, habit.id, month.as_deref())
            .map_err(|e| format!("Failed to list completions: {}", e))?;
        out.push(HabitWithCompletions {
            completed_count: completions.iter().filter(|c| c.completed).count(),
            habit,
            completions,
        });
    }

    Ok(ListHabitsResponse {
        month,
        count: out.len(),
        habits: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_monthly_listing() {
        let db = Database::in_memory().unwrap();
        let walk = create_habit(&db, "Walk 10k steps", None).unwrap();

        assert!(toggle_habit(&db, walk.id, "2025-03-01").unwrap().completed);
        assert!(toggle_habit(&db, walk.id, "2025-03-02").unwrap().completed);
        assert!(!toggle_habit(&db, walk.id, "2025-03-02").unwrap().completed);
        toggle_habit(&db, walk.id, "2025-04-01").unwrap();

        let march = list_habits(&db, Some("2025-03")).unwrap();
        assert_eq!(march.habits[0].completions.len(), 2);
        assert_eq!(march.habits[0].completed_count, 1);

        let all = list_habits(&db, None).unwrap();
        assert_eq!(all.habits[0].completed_count, 2);
    }

    #[test]
    fn test_toggle_unknown_habit_errors() {
        let db = Database::in_memory().unwrap();
        assert!(toggle_habit(&db, 5, "2025-03-01").is_err());
        assert!(list_habits(&db, Some("March")).is_err());
    }

    #[test]
    fn test_delete_habit() {
        let db = Database::in_memory().unwrap();
        let h = create_habit(&db, "Meditate", Some("10 minutes".into())).unwrap();
        toggle_habit(&db, h.id, "2025-03-01").unwrap();

        let detail = get_habit(&db, h.id).unwrap().unwrap();
        assert_eq!(detail.habit.description.as_deref(), Some("10 minutes"));
        assert_eq!(detail.completed_count, 1);

        assert!(delete_habit(&db, h.id).unwrap().is_some());
        assert_eq!(list_habits(&db, None).unwrap().count, 0);
        assert!(delete_habit(&db, h.id).unwrap().is_none());
    }
}
