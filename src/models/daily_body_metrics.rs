//! Daily body metrics model
//!
//! Smart-scale style readings, one record per date.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::coerce::opt_f64;
use crate::db::{DbError, DbResult};

/// Measured values. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyMetrics {
    pub weight: Option<f64>,           // kg
    pub body_fat: Option<f64>,         // %
    pub muscle_mass: Option<f64>,      // kg
    pub visceral_fat: Option<f64>,     // rating
    pub bmi: Option<f64>,
    pub body_water: Option<f64>,       // %
    pub bone_mass: Option<f64>,        // kg
    pub basal_metabolism: Option<f64>, // kcal
    pub notes: Option<String>,
}

impl BodyMetrics {
    /// Check ranges: percentages within 0..=100, everything else non-negative
    pub fn validate(&self) -> Result<(), String> {
        let percentages = [("body_fat", self.body_fat), ("body_water", self.body_water)];
        for (name, value) in percentages {
            if let Some(v) = value {
                if !v.is_finite() || !(0.0..=100.0).contains(&v) {
                    return Err(format!("{} must be between 0 and 100", name));
                }
            }
        }

        let non_negative = [
            ("weight", self.weight),
            ("muscle_mass", self.muscle_mass),
            ("visceral_fat", self.visceral_fat),
            ("bmi", self.bmi),
            ("bone_mass", self.bone_mass),
            ("basal_metabolism", self.basal_metabolism),
        ];
        for (name, value) in non_negative {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(format!("{} must be 0 or greater", name));
                }
            }
        }

        Ok(())
    }

    fn overlay(&self, other: &BodyMetrics) -> Self {
        Self {
            weight: other.weight.or(self.weight),
            body_fat: other.body_fat.or(self.body_fat),
            muscle_mass: other.muscle_mass.or(self.muscle_mass),
            visceral_fat: other.visceral_fat.or(self.visceral_fat),
            bmi: other.bmi.or(self.bmi),
            body_water: other.body_water.or(self.body_water),
            bone_mass: other.bone_mass.or(self.bone_mass),
            basal_metabolism: other.basal_metabolism.or(self.basal_metabolism),
            notes: other.notes.clone().or_else(|| self.notes.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBodyMetrics {
    pub id: i64,
    pub date: String,
    #[serde(flatten)]
    pub metrics: BodyMetrics,
    pub created_at: String,
    pub updated_at: String,
}

impl DailyBodyMetrics {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            metrics: BodyMetrics {
                weight: opt_f64(row, "weight")?,
                body_fat: opt_f64(row, "body_fat")?,
                muscle_mass: opt_f64(row, "muscle_mass")?,
                visceral_fat: opt_f64(row, "visceral_fat")?,
                bmi: opt_f64(row, "bmi")?,
                body_water: opt_f64(row, "body_water")?,
                bone_mass: opt_f64(row, "bone_mass")?,
                basal_metabolism: opt_f64(row, "basal_metabolism")?,
                notes: row.get("notes")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM daily_body_metrics WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_by_date(conn: &Connection, date: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM daily_body_metrics WHERE date = ?1")?;

        let result = stmt.query_row([date], Self::from_row);
        match result {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List readings in an inclusive date range, newest first
    pub fn list(
        conn: &Connection,
        start_date: Option<&str>,
        end_date: Option<&str>,
        limit: i64,
    ) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM daily_body_metrics
            WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
            ORDER BY date DESC
            LIMIT ?3
            "#,
        )?;
        let rows = stmt
            .query_map(params![start_date, end_date, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn put(conn: &Connection, date: &str, m: &BodyMetrics) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO daily_body_metrics
                (date, weight, body_fat, muscle_mass, visceral_fat, bmi, body_water, bone_mass, basal_metabolism, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(date) DO UPDATE SET
                weight = excluded.weight,
                body_fat = excluded.body_fat,
                muscle_mass = excluded.muscle_mass,
                visceral_fat = excluded.visceral_fat,
                bmi = excluded.bmi,
                body_water = excluded.body_water,
                bone_mass = excluded.bone_mass,
                basal_metabolism = excluded.basal_metabolism,
                notes = excluded.notes,
                updated_at = datetime('now')
            "#,
            params![
                date,
                m.weight,
                m.body_fat,
                m.muscle_mass,
                m.visceral_fat,
                m.bmi,
                m.body_water,
                m.bone_mass,
                m.basal_metabolism,
                m.notes,
            ],
        )?;

        Self::get_by_date(conn, date)?
            .ok_or_else(|| DbError::Conflict(format!("body metrics for {} vanished after write", date)))
    }

    /// Set the provided fields for `date`, creating the record if needed
    pub fn upsert(conn: &Connection, date: &str, metrics: &BodyMetrics) -> DbResult<Self> {
        let existing = Self::get_by_date(conn, date)?
            .map(|m| m.metrics)
            .unwrap_or_default();
        Self::put(conn, date, &existing.overlay(metrics))
    }

    pub fn update(conn: &Connection, id: i64, metrics: &BodyMetrics) -> DbResult<Option<Self>> {
        let Some(existing) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };
        Self::put(conn, &existing.date, &existing.metrics.overlay(metrics)).map(Some)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM daily_body_metrics WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_validate_ranges() {
        assert!(BodyMetrics { body_fat: Some(18.5), weight: Some(72.0), ..Default::default() }.validate().is_ok());
        assert!(BodyMetrics { body_fat: Some(100.1), ..Default::default() }.validate().is_err());
        assert!(BodyMetrics { body_water: Some(-1.0), ..Default::default() }.validate().is_err());
        assert!(BodyMetrics { bmi: Some(-0.1), ..Default::default() }.validate().is_err());
        assert!(BodyMetrics { basal_metabolism: Some(f64::NAN), ..Default::default() }.validate().is_err());
    }

    #[test]
    fn test_upsert_merges_fields() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let first = DailyBodyMetrics::upsert(conn, "2025-02-10", &BodyMetrics { weight: Some(80.2), ..Default::default() })?;
            let second = DailyBodyMetrics::upsert(
                conn,
                "2025-02-10",
                &BodyMetrics { body_fat: Some(21.0), notes: Some("morning".into()), ..Default::default() },
            )?;

            assert_eq!(first.id, second.id);
            assert_eq!(second.metrics.weight, Some(80.2));
            assert_eq!(second.metrics.body_fat, Some(21.0));
            assert_eq!(second.metrics.notes.as_deref(), Some("morning"));
            Ok(())
        })
        .unwrap();
    }
}
