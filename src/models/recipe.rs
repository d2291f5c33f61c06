//! Recipe model
//!
//! A recipe is an ordered list of ingredient lines plus a scaling factor
//! applied to the whole list. Nutrition is computed on read, never cached.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::coerce::{opt_f64, scaling_factor};
use crate::db::{DbError, DbResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub instructions: Option<String>,
    pub scaling_factor: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub name: String,
    pub instructions: Option<String>,
    pub scaling_factor: Option<f64>,
}

/// Data for updating a recipe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub instructions: Option<String>,
    pub scaling_factor: Option<f64>,
}

impl Recipe {
    /// Create a Recipe from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            instructions: row.get("instructions")?,
            scaling_factor: scaling_factor(opt_f64(row, "scaling_factor")?),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new recipe. A missing or non-positive scaling factor is stored as 1.
    pub fn create(conn: &Connection, data: &RecipeCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO recipes (name, instructions, scaling_factor) VALUES (?1, ?2, ?3)",
            params![data.name, data.instructions, scaling_factor(data.scaling_factor)],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Recipe", id))
    }

    /// Get a recipe by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(recipe) => Ok(Some(recipe)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List recipes, optionally filtered by name
    pub fn list(conn: &Connection, query: Option<&str>) -> DbResult<Vec<Self>> {
        let pattern = query.map(|q| format!("%{}%", q.trim()));
        let mut stmt = conn.prepare(
            "SELECT * FROM recipes WHERE ?1 IS NULL OR name LIKE ?1 ORDER BY name COLLATE NOCASE",
        )?;

        let recipes = stmt
            .query_map([pattern], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(recipes)
    }

    /// Update a recipe
    pub fn update(conn: &Connection, id: i64, data: &RecipeUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref instructions) = data.instructions {
            updates.push(format!("instructions = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(instructions.clone()));
        }
        if data.scaling_factor.is_some() {
            updates.push(format!("scaling_factor = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(scaling_factor(data.scaling_factor)));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE recipes SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a recipe together with its lines.
    ///
    /// Expects to run inside a transaction (see `Database::transaction`).
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        conn.execute("DELETE FROM recipe_ingredients WHERE recipe_id = ?1", [id])?;
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
