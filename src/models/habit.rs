//! Habit model
//!
//! Habits and their per-date completion records.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitCompletion {
    pub id: i64,
    pub habit_id: i64,
    pub date: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitCreate {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Habit {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(conn: &Connection, data: &HabitCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO habits (name, description) VALUES (?1, ?2)",
            params![data.name, data.description],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Habit", id))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM habits WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(habit) => Ok(Some(habit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM habits ORDER BY created_at, id")?;
        let habits = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(habits)
    }

    pub fn update(conn: &Connection, id: i64, data: &HabitUpdate) -> DbResult<Option<Self>> {
        let Some(current) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        conn.execute(
            "UPDATE habits SET name = ?1, description = ?2, updated_at = datetime('now') WHERE id = ?3",
            params![
                data.name.clone().unwrap_or(current.name),
                data.description.clone().or(current.description),
                id,
            ],
        )?;

        Self::get_by_id(conn, id)
    }

    /// Delete a habit and its completions. Expects to run inside a transaction.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        conn.execute("DELETE FROM habit_completions WHERE habit_id = ?1", [id])?;
        let rows = conn.execute("DELETE FROM habits WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

impl HabitCompletion {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            habit_id: row.get("habit_id")?,
            date: row.get("date")?,
            completed: row.get::<_, i32>("completed")? != 0,
        })
    }

    pub fn get(conn: &Connection, habit_id: i64, date: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM habit_completions WHERE habit_id = ?1 AND date = ?2")?;

        let result = stmt.query_row(params![habit_id, date], Self::from_row);
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// First toggle records the habit as done; later toggles flip it
    pub fn toggle(conn: &Connection, habit_id: i64, date: &str) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO habit_completions (habit_id, date, completed) VALUES (?1, ?2, 1)
            ON CONFLICT(habit_id, date) DO UPDATE SET completed = 1 - completed
            "#,
            params![habit_id, date],
        )?;

        Self::get(conn, habit_id, date)?.ok_or(DbError::NotFound("Habit", habit_id))
    }

    /// Completions for a habit, optionally limited to dates starting with `month` (YYYY-MM)
    pub fn list_for_habit(conn: &Connection, habit_id: i64, month: Option<&str>) -> DbResult<Vec<Self>> {
        let pattern = month.map(|m| format!("{}-%", m));
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM habit_completions
            WHERE habit_id = ?1 AND (?2 IS NULL OR date LIKE ?2)
            ORDER BY date
            "#,
        )?;
        let completions = stmt
            .query_map(params![habit_id, pattern], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(completions)
    }
}
