//! Ingredient model
//!
//! Base nutritional data. All coefficients are stored per gram.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::coerce::f64_or_zero;
use crate::db::{DbError, DbResult};
use super::Nutrition;

/// An ingredient with per-gram nutrient coefficients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub per_gram: Nutrition,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new ingredient
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientCreate {
    pub name: String,
    #[serde(flatten)]
    pub per_gram: Nutrition,
}

/// Data for updating an ingredient
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientUpdate {
    pub name: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
    pub fiber: Option<f64>,
}

impl Ingredient {
    /// Create an Ingredient from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            per_gram: Nutrition {
                calories: f64_or_zero(row, "calories")?,
                protein: f64_or_zero(row, "protein")?,
                carbs: f64_or_zero(row, "carbs")?,
                fats: f64_or_zero(row, "fats")?,
                fiber: f64_or_zero(row, "fiber")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new ingredient
    pub fn create(conn: &Connection, data: &IngredientCreate) -> DbResult<Self> {
        let n = &data.per_gram;
        conn.execute(
            r#"
            INSERT INTO ingredients (name, calories, protein, carbs, fats, fiber)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![data.name, n.calories, n.protein, n.carbs, n.fats, n.fiber],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Ingredient", id))
    }

    /// Get an ingredient by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredients WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(ingredient) => Ok(Some(ingredient)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all ingredients alphabetically
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredients ORDER BY name COLLATE NOCASE, id")?;
        let ingredients = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ingredients)
    }

    /// Search ingredients by name (case-insensitive substring)
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", query.trim());
        let mut stmt = conn.prepare(
            "SELECT * FROM ingredients WHERE name LIKE ?1 ORDER BY name COLLATE NOCASE LIMIT ?2",
        )?;
        let ingredients = stmt
            .query_map(params![pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ingredients)
    }

    /// Update an ingredient, leaving unspecified fields alone
    pub fn update(conn: &Connection, id: i64, data: &IngredientUpdate) -> DbResult<Option<Self>> {
        let Some(current) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let name = data.name.clone().unwrap_or(current.name);
        let c = current.per_gram;
        conn.execute(
            r#"
            UPDATE ingredients SET
                name = ?1, calories = ?2, protein = ?3, carbs = ?4, fats = ?5, fiber = ?6,
                updated_at = datetime('now')
            WHERE id = ?7
            "#,
            params![
                name,
                data.calories.unwrap_or(c.calories),
                data.protein.unwrap_or(c.protein),
                data.carbs.unwrap_or(c.carbs),
                data.fats.unwrap_or(c.fats),
                data.fiber.unwrap_or(c.fiber),
                id,
            ],
        )?;

        Self::get_by_id(conn, id)
    }

    /// Delete an ingredient. Its custom units go with it; recipe lines that
    /// reference it are left in place.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Number of recipe lines referencing this ingredient
    pub fn count_recipe_lines(conn: &Connection, id: i64) -> DbResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM recipe_ingredients WHERE ingredient_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn oats() -> IngredientCreate {
        IngredientCreate {
            name: "Oats".to_string(),
            per_gram: Nutrition { calories: 3.89, protein: 0.169, carbs: 0.663, fats: 0.069, fiber: 0.106 },
        }
    }

    #[test]
    fn test_create_and_update() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let created = Ingredient::create(conn, &oats())?;
            assert_eq!(created.name, "Oats");
            assert_eq!(created.per_gram.calories, 3.89);

            let update = IngredientUpdate { calories: Some(4.0), ..Default::default() };
            let updated = Ingredient::update(conn, created.id, &update)?.unwrap();
            assert_eq!(updated.per_gram.calories, 4.0);
            assert_eq!(updated.per_gram.protein, 0.169);
            assert_eq!(updated.name, "Oats");

            assert!(Ingredient::update(conn, 999, &update)?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            Ingredient::create(conn, &oats())?;
            Ingredient::create(conn, &IngredientCreate { name: "Milk".into(), ..Default::default() })?;

            let found = Ingredient::search(conn, "oat", 10)?;
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].name, "Oats");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_text_coefficient_is_coerced() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO ingredients (name, calories, protein) VALUES ('Odd', '2.5', 'n/a')",
                [],
            )?;
            let ingredient = Ingredient::get_by_id(conn, conn.last_insert_rowid())?.unwrap();
            assert_eq!(ingredient.per_gram.calories, 2.5);
            assert_eq!(ingredient.per_gram.protein, 0.0);
            Ok(())
        })
        .unwrap();
    }
}
