//! Daily nutrition model
//!
//! One accumulator record per calendar date. Fields are nullable: a day that
//! only ever had water logged has no calories yet, which is not the same as
//! zero calories.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::coerce::opt_f64;
use crate::db::{DbError, DbResult};

/// Stored values for a day. `None` means never logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyValues {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
    pub fiber: Option<f64>,
    pub water: Option<f64>, // liters
}

impl DailyValues {
    /// Overlay the fields that are set in `other`
    pub fn overlay(&self, other: &DailyValues) -> Self {
        Self {
            calories: other.calories.or(self.calories),
            protein: other.protein.or(self.protein),
            carbs: other.carbs.or(self.carbs),
            fats: other.fats.or(self.fats),
            fiber: other.fiber.or(self.fiber),
            water: other.water.or(self.water),
        }
    }

    /// Name of the first negative or non-finite field, if any
    pub fn first_invalid(&self) -> Option<&'static str> {
        [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fats", self.fats),
            ("fiber", self.fiber),
            ("water", self.water),
        ]
        .into_iter()
        .find(|(_, v)| matches!(v, Some(x) if !x.is_finite() || *x < 0.0))
        .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyNutrition {
    pub id: i64,
    pub date: String,
    #[serde(flatten)]
    pub values: DailyValues,
    pub created_at: String,
    pub updated_at: String,
}

impl DailyNutrition {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            values: DailyValues {
                calories: opt_f64(row, "calories")?,
                protein: opt_f64(row, "protein")?,
                carbs: opt_f64(row, "carbs")?,
                fats: opt_f64(row, "fats")?,
                fiber: opt_f64(row, "fiber")?,
                water: opt_f64(row, "water")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM daily_nutrition WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(day) => Ok(Some(day)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_by_date(conn: &Connection, date: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM daily_nutrition WHERE date = ?1")?;

        let result = stmt.query_row([date], Self::from_row);
        match result {
            Ok(day) => Ok(Some(day)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List records in an inclusive date range, newest first
    pub fn list(
        conn: &Connection,
        start_date: Option<&str>,
        end_date: Option<&str>,
        limit: i64,
    ) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM daily_nutrition
            WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
            ORDER BY date DESC
            LIMIT ?3
            "#,
        )?;
        let days = stmt
            .query_map(params![start_date, end_date, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(days)
    }

    /// Write `values` for `date`, inserting or replacing every field.
    ///
    /// Callers decide what the full set of values is; see `save` for a
    /// partial write.
    pub fn put(conn: &Connection, date: &str, values: &DailyValues) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO daily_nutrition (date, calories, protein, carbs, fats, fiber, water)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(date) DO UPDATE SET
                calories = excluded.calories,
                protein = excluded.protein,
                carbs = excluded.carbs,
                fats = excluded.fats,
                fiber = excluded.fiber,
                water = excluded.water,
                updated_at = datetime('now')
            "#,
            params![
                date,
                values.calories,
                values.protein,
                values.carbs,
                values.fats,
                values.fiber,
                values.water,
            ],
        )?;

        Self::get_by_date(conn, date)?
            .ok_or_else(|| DbError::Conflict(format!("daily nutrition for {} vanished after write", date)))
    }

    /// Set the provided fields for `date`, keeping the rest
    pub fn save(conn: &Connection, date: &str, values: &DailyValues) -> DbResult<Self> {
        let existing = Self::get_by_date(conn, date)?
            .map(|day| day.values)
            .unwrap_or_default();
        Self::put(conn, date, &existing.overlay(values))
    }

    /// Set the provided fields on an existing record
    pub fn update(conn: &Connection, id: i64, values: &DailyValues) -> DbResult<Option<Self>> {
        let Some(existing) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };
        Self::put(conn, &existing.date, &existing.values.overlay(values)).map(Some)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM daily_nutrition WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_save_sets_only_provided_fields() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            DailyNutrition::save(conn, "2025-03-01", &DailyValues { calories: Some(1800.0), water: Some(1.5), ..Default::default() })?;
            let day = DailyNutrition::save(conn, "2025-03-01", &DailyValues { protein: Some(90.0), ..Default::default() })?;

            assert_eq!(day.values.calories, Some(1800.0));
            assert_eq!(day.values.protein, Some(90.0));
            assert_eq!(day.values.water, Some(1.5));
            assert_eq!(day.values.fiber, None);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_one_record_per_date() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let a = DailyNutrition::save(conn, "2025-03-01", &DailyValues { calories: Some(1.0), ..Default::default() })?;
            let b = DailyNutrition::save(conn, "2025-03-01", &DailyValues { calories: Some(2.0), ..Default::default() })?;
            assert_eq!(a.id, b.id);

            let count: i64 = conn.query_row("SELECT COUNT(*) FROM daily_nutrition", [], |r| r.get(0))?;
            assert_eq!(count, 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_list_newest_first_within_range() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            for date in ["2025-03-01", "2025-03-05", "2025-03-03", "2025-04-01"] {
                DailyNutrition::save(conn, date, &DailyValues { calories: Some(100.0), ..Default::default() })?;
            }

            let days = DailyNutrition::list(conn, Some("2025-03-01"), Some("2025-03-31"), 50)?;
            let dates: Vec<&str> = days.iter().map(|d| d.date.as_str()).collect();
            assert_eq!(dates, vec!["2025-03-05", "2025-03-03", "2025-03-01"]);

            assert_eq!(DailyNutrition::list(conn, None, None, 50)?.len(), 4);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_first_invalid() {
        assert_eq!(DailyValues::default().first_invalid(), None);
        let bad = DailyValues { water: Some(-0.5), ..Default::default() };
        assert_eq!(bad.first_invalid(), Some("water"));
    }
}
