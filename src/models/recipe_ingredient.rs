//! Recipe Ingredient model
//!
//! A line item: ingredient reference, optional custom unit (absent = grams),
//! quantity and display order.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::coerce::f64_or_zero;
use crate::db::{DbError, DbResult};
use crate::nutrition::UnitRef;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub unit_id: Option<i64>,
    pub quantity: f64,
    pub order: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for adding a line to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientCreate {
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub unit: UnitRef,
    pub quantity: f64,
}

/// Data for updating a line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeIngredientUpdate {
    pub quantity: Option<f64>,
    pub unit: Option<UnitRef>,
}

impl RecipeIngredient {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            ingredient_id: row.get("ingredient_id")?,
            unit_id: row.get("unit_id")?,
            quantity: f64_or_zero(row, "quantity")?,
            order: row.get("sort_order")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn unit(&self) -> UnitRef {
        UnitRef::from_unit_id(self.unit_id)
    }

    /// Append a line; its order is one past the current maximum (0 for the first line)
    pub fn create(conn: &Connection, data: &RecipeIngredientCreate) -> DbResult<Self> {
        let next_order: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM recipe_ingredients WHERE recipe_id = ?1",
            [data.recipe_id],
            |row| row.get(0),
        )?;

        conn.execute(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, unit_id, quantity, sort_order)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.recipe_id,
                data.ingredient_id,
                data.unit.unit_id(),
                data.quantity,
                next_order,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Recipe ingredient", id))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipe_ingredients WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(line) => Ok(Some(line)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All lines of a recipe in display order
    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY sort_order, id",
        )?;

        let lines = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lines)
    }

    pub fn update(conn: &Connection, id: i64, data: &RecipeIngredientUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(qty) = data.quantity {
            updates.push(format!("quantity = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(qty));
        }
        if let Some(unit) = data.unit {
            updates.push(format!("unit_id = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(unit.unit_id()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE recipe_ingredients SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipe_ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Rewrite the order of a recipe's lines to `0..n` following `line_ids`.
    ///
    /// `line_ids` must name every line of the recipe exactly once. Expects to
    /// run inside a transaction.
    pub fn reorder(conn: &Connection, recipe_id: i64, line_ids: &[i64]) -> DbResult<Vec<Self>> {
        let mut current: Vec<i64> = Self::get_for_recipe(conn, recipe_id)?
            .into_iter()
            .map(|line| line.id)
            .collect();
        let mut requested = line_ids.to_vec();
        current.sort_unstable();
        requested.sort_unstable();
        if current != requested {
            return Err(DbError::Conflict(format!(
                "reorder must list each of the recipe's {} lines exactly once",
                current.len()
            )));
        }

        for (position, line_id) in line_ids.iter().enumerate() {
            conn.execute(
                "UPDATE recipe_ingredients SET sort_order = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![position as i64, line_id],
            )?;
        }

        Self::get_for_recipe(conn, recipe_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Recipe, RecipeCreate};

    fn line(recipe_id: i64, ingredient_id: i64) -> RecipeIngredientCreate {
        RecipeIngredientCreate { recipe_id, ingredient_id, unit: UnitRef::Grams, quantity: 100.0 }
    }

    #[test]
    fn test_order_is_max_plus_one() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let recipe = Recipe::create(conn, &RecipeCreate { name: "Salad".into(), instructions: None, scaling_factor: None })?;

            let first = RecipeIngredient::create(conn, &line(recipe.id, 1))?;
            let second = RecipeIngredient::create(conn, &line(recipe.id, 2))?;
            assert_eq!(first.order, 0);
            assert_eq!(second.order, 1);

            // Gaps are tolerated; the next line still goes after the max
            RecipeIngredient::delete(conn, first.id)?;
            let third = RecipeIngredient::create(conn, &line(recipe.id, 3))?;
            assert_eq!(third.order, 2);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_reorder_rewrites_contiguously() {
        let db = Database::in_memory().unwrap();
        let lines = db
            .transaction(|tx| {
                let recipe = Recipe::create(tx, &RecipeCreate { name: "Stew".into(), instructions: None, scaling_factor: None })?;
                let a = RecipeIngredient::create(tx, &line(recipe.id, 1))?;
                let b = RecipeIngredient::create(tx, &line(recipe.id, 2))?;
                let c = RecipeIngredient::create(tx, &line(recipe.id, 3))?;
                RecipeIngredient::reorder(tx, recipe.id, &[c.id, a.id, b.id])
            })
            .unwrap();

        let ingredient_ids: Vec<i64> = lines.iter().map(|l| l.ingredient_id).collect();
        assert_eq!(ingredient_ids, vec![3, 1, 2]);
        let orders: Vec<i64> = lines.iter().map(|l| l.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_reorder_rejects_partial_list() {
        let db = Database::in_memory().unwrap();
        let result = db.transaction(|tx| {
            let recipe = Recipe::create(tx, &RecipeCreate { name: "Soup".into(), instructions: None, scaling_factor: None })?;
            let a = RecipeIngredient::create(tx, &line(recipe.id, 1))?;
            RecipeIngredient::create(tx, &line(recipe.id, 2))?;
            RecipeIngredient::reorder(tx, recipe.id, &[a.id])
        });
        assert!(matches!(result, Err(DbError::Conflict(_))));
    }

    #[test]
    fn test_update_unit_back_to_grams() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let recipe = Recipe::create(conn, &RecipeCreate { name: "Rice".into(), instructions: None, scaling_factor: None })?;
            let created = RecipeIngredient::create(
                conn,
                &RecipeIngredientCreate { recipe_id: recipe.id, ingredient_id: 1, unit: UnitRef::Custom(7), quantity: 2.0 },
            )?;
            assert_eq!(created.unit(), UnitRef::Custom(7));

            let update = RecipeIngredientUpdate { quantity: Some(150.0), unit: Some(UnitRef::Grams) };
            let updated = RecipeIngredient::update(conn, created.id, &update)?.unwrap();
            assert_eq!(updated.unit_id, None);
            assert_eq!(updated.quantity, 150.0);
            Ok(())
        })
        .unwrap();
    }
}
