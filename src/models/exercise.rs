//! Exercise model
//!
//! The exercise library: what an exercise is and which muscles it works.
//! Sessions live in workout plans.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Muscle groups an exercise can involve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Muscle {
    Chest,
    Back,
    Shoulders,
    Arms,
    Biceps,
    Triceps,
    Legs,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
    Core,
    Abs,
}

impl Muscle {
    pub const ALL: [Muscle; 13] = [
        Muscle::Chest,
        Muscle::Back,
        Muscle::Shoulders,
        Muscle::Arms,
        Muscle::Biceps,
        Muscle::Triceps,
        Muscle::Legs,
        Muscle::Quads,
        Muscle::Hamstrings,
        Muscle::Glutes,
        Muscle::Calves,
        Muscle::Core,
        Muscle::Abs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Muscle::Chest => "chest",
            Muscle::Back => "back",
            Muscle::Shoulders => "shoulders",
            Muscle::Arms => "arms",
            Muscle::Biceps => "biceps",
            Muscle::Triceps => "triceps",
            Muscle::Legs => "legs",
            Muscle::Quads => "quads",
            Muscle::Hamstrings => "hamstrings",
            Muscle::Glutes => "glutes",
            Muscle::Calves => "calves",
            Muscle::Core => "core",
            Muscle::Abs => "abs",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

/// An exercise in the library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub video_url: Option<String>,
    pub muscles_involved: Vec<Muscle>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new exercise
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExerciseCreate {
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub video_url: Option<String>,
    pub muscles_involved: Vec<Muscle>,
}

/// Data for updating an exercise
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExerciseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub video_url: Option<String>,
    pub muscles_involved: Option<Vec<Muscle>>,
}

/// Decode the stored JSON list, dropping anything outside the vocabulary
fn decode_muscles(raw: &str) -> Vec<Muscle> {
    serde_json::from_str::<Vec<String>>(raw)
        .unwrap_or_default()
        .iter()
        .filter_map(|s| Muscle::from_str(s))
        .collect()
}

fn encode_muscles(muscles: &[Muscle]) -> DbResult<String> {
    let mut names: Vec<&str> = Vec::new();
    for m in muscles {
        if !names.contains(&m.as_str()) {
            names.push(m.as_str());
        }
    }
    Ok(serde_json::to_string(&names)?)
}

impl Exercise {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let muscles: Option<String> = row.get("muscles_involved")?;

        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            photo_url: row.get("photo_url")?,
            video_url: row.get("video_url")?,
            muscles_involved: muscles.as_deref().map(decode_muscles).unwrap_or_default(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(conn: &Connection, data: &ExerciseCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO exercises (name, description, photo_url, video_url, muscles_involved)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.name,
                data.description,
                data.photo_url,
                data.video_url,
                encode_muscles(&data.muscles_involved)?,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Exercise", id))
    }

    /// Get an exercise by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM exercises WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(exercise) => Ok(Some(exercise)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List exercises, optionally only those working `muscle`
    pub fn list(conn: &Connection, muscle: Option<Muscle>) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM exercises ORDER BY name COLLATE NOCASE")?;
        let exercises = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match muscle {
            Some(m) => exercises
                .into_iter()
                .filter(|e| e.muscles_involved.contains(&m))
                .collect(),
            None => exercises,
        })
    }

    pub fn update(conn: &Connection, id: i64, data: &ExerciseUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref description) = data.description {
            updates.push(format!("description = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(description.clone()));
        }
        if let Some(ref url) = data.photo_url {
            updates.push(format!("photo_url = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(url.clone()));
        }
        if let Some(ref url) = data.video_url {
            updates.push(format!("video_url = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(url.clone()));
        }
        if let Some(ref muscles) = data.muscles_involved {
            updates.push(format!("muscles_involved = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(encode_muscles(muscles)?));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE exercises SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Number of workout entries using this exercise
    pub fn count_workout_entries(conn: &Connection, id: i64) -> DbResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM workout_exercises WHERE exercise_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM exercises WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_muscle_from_str() {
        assert_eq!(Muscle::from_str("Glutes"), Some(Muscle::Glutes));
        assert_eq!(Muscle::from_str(" abs "), Some(Muscle::Abs));
        assert_eq!(Muscle::from_str("neck"), None);
    }

    #[test]
    fn test_muscles_round_trip_through_storage() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let squat = Exercise::create(
                conn,
                &ExerciseCreate {
                    name: "Back Squat".into(),
                    muscles_involved: vec![Muscle::Quads, Muscle::Glutes, Muscle::Quads],
                    ..Default::default()
                },
            )?;
            assert_eq!(squat.muscles_involved, vec![Muscle::Quads, Muscle::Glutes]);

            Exercise::create(conn, &ExerciseCreate { name: "Bench".into(), muscles_involved: vec![Muscle::Chest], ..Default::default() })?;
            let leg_days = Exercise::list(conn, Some(Muscle::Glutes))?;
            assert_eq!(leg_days.len(), 1);
            assert_eq!(leg_days[0].name, "Back Squat");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_unknown_stored_muscles_are_dropped() {
        assert_eq!(decode_muscles(r#"["chest","neck"]"#), vec![Muscle::Chest]);
        assert!(decode_muscles("not json").is_empty());
    }
}
