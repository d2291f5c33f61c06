//! Custom unit model
//!
//! A named measure belonging to one ingredient, e.g. "1 cup = 240 g".

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomUnit {
    pub id: i64,
    pub ingredient_id: i64,
    pub unit_name: String,
    pub grams_equivalent: f64,
    pub created_at: String,
}

/// Data for creating a custom unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomUnitCreate {
    pub ingredient_id: i64,
    pub unit_name: String,
    pub grams_equivalent: f64,
}

impl CustomUnit {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            ingredient_id: row.get("ingredient_id")?,
            unit_name: row.get("unit_name")?,
            grams_equivalent: row.get("grams_equivalent")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn create(conn: &Connection, data: &CustomUnitCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO custom_units (ingredient_id, unit_name, grams_equivalent) VALUES (?1, ?2, ?3)",
            params![data.ingredient_id, data.unit_name, data.grams_equivalent],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Custom unit", id))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM custom_units WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(unit) => Ok(Some(unit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Units defined for one ingredient
    pub fn list_for_ingredient(conn: &Connection, ingredient_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM custom_units WHERE ingredient_id = ?1 ORDER BY unit_name COLLATE NOCASE",
        )?;
        let units = stmt
            .query_map([ingredient_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(units)
    }

    pub fn list_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM custom_units ORDER BY ingredient_id, unit_name COLLATE NOCASE")?;
        let units = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(units)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM custom_units WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Ingredient, IngredientCreate};

    #[test]
    fn test_units_cascade_with_ingredient() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let rice = Ingredient::create(conn, &IngredientCreate { name: "Rice".into(), ..Default::default() })?;
            let cup = CustomUnit::create(
                conn,
                &CustomUnitCreate { ingredient_id: rice.id, unit_name: "cup".into(), grams_equivalent: 185.0 },
            )?;
            assert_eq!(CustomUnit::list_for_ingredient(conn, rice.id)?.len(), 1);

            Ingredient::delete(conn, rice.id)?;
            assert!(CustomUnit::get_by_id(conn, cup.id)?.is_none());
            assert!(CustomUnit::list_all(conn)?.is_empty());
            Ok(())
        })
        .unwrap();
    }
}
