//! Recipe nutrition aggregation
//!
//! Lines resolve to grams, grams times per-gram coefficients are summed, and
//! the sum is multiplied by the recipe's scaling factor. Rounding to two
//! decimals happens once, on the scaled total.
//!
//! Unresolvable references never fail the computation: a line whose
//! ingredient is gone contributes nothing, and a line whose custom unit is
//! gone is read as grams.

use rusqlite::Connection;
use tracing::warn;

use crate::db::coerce::scaling_factor;
use crate::db::DbResult;
use crate::models::{CustomUnit, Ingredient, Nutrition, RecipeIngredient};
use super::units::UnitRef;

/// Ingredient and custom unit lookups needed by aggregation
pub trait NutritionLookup {
    /// Per-gram coefficients for an ingredient, `None` if it does not exist
    fn ingredient_per_gram(&self, ingredient_id: i64) -> DbResult<Option<Nutrition>>;

    fn custom_unit(&self, unit_id: i64) -> DbResult<Option<CustomUnit>>;
}

impl NutritionLookup for Connection {
    fn ingredient_per_gram(&self, ingredient_id: i64) -> DbResult<Option<Nutrition>> {
        Ok(Ingredient::get_by_id(self, ingredient_id)?.map(|i| i.per_gram))
    }

    fn custom_unit(&self, unit_id: i64) -> DbResult<Option<CustomUnit>> {
        CustomUnit::get_by_id(self, unit_id)
    }
}

/// One quantity of one ingredient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub ingredient_id: i64,
    pub unit: UnitRef,
    pub quantity: f64,
}

impl From<&RecipeIngredient> for Line {
    fn from(line: &RecipeIngredient) -> Self {
        Self {
            ingredient_id: line.ingredient_id,
            unit: line.unit(),
            quantity: line.quantity,
        }
    }
}

/// Grams represented by `quantity` of `unit` (absent = grams).
///
/// Sign is not checked; a non-finite quantity counts as zero.
pub fn grams_for_line(quantity: f64, unit: Option<&CustomUnit>) -> f64 {
    let quantity = if quantity.is_finite() { quantity } else { 0.0 };
    match unit {
        Some(unit) => quantity * unit.grams_equivalent,
        None => quantity,
    }
}

/// Recipe multiplier; absent, non-finite and non-positive factors become 1
pub fn effective_scaling_factor(factor: Option<f64>) -> f64 {
    scaling_factor(factor)
}

/// Unscaled, unrounded nutrition of a single line
pub fn line_nutrition<L: NutritionLookup + ?Sized>(lookup: &L, line: &Line) -> DbResult<Nutrition> {
    let Some(per_gram) = lookup.ingredient_per_gram(line.ingredient_id)? else {
        warn!("Ingredient {} not found; line contributes nothing", line.ingredient_id);
        return Ok(Nutrition::zero());
    };

    let unit = match line.unit {
        UnitRef::Grams => None,
        UnitRef::Custom(unit_id) => {
            let unit = lookup.custom_unit(unit_id)?;
            if unit.is_none() {
                warn!("Custom unit {} not found; quantity read as grams", unit_id);
            }
            unit
        }
    };

    let grams = grams_for_line(line.quantity, unit.as_ref());
    Ok(per_gram.sanitized().scale(grams).sanitized())
}

/// Sum of the unscaled nutrition of every line
pub fn accumulate<'a, L, I>(lookup: &L, lines: I) -> DbResult<Nutrition>
where
    L: NutritionLookup + ?Sized,
    I: IntoIterator<Item = &'a Line>,
{
    lines
        .into_iter()
        .map(|line| line_nutrition(lookup, line))
        .sum::<DbResult<Nutrition>>()
}

/// Scaled, rounded totals for a recipe
pub fn recipe_totals<L: NutritionLookup + ?Sized>(
    lookup: &L,
    lines: &[Line],
    factor: Option<f64>,
) -> DbResult<Nutrition> {
    let total = accumulate(lookup, lines)?;
    Ok(total.scale(effective_scaling_factor(factor)).sanitized().rounded())
}

/// Scaled, rounded contribution of one line, for per-line display
pub fn line_contribution<L: NutritionLookup + ?Sized>(
    lookup: &L,
    line: &Line,
    factor: Option<f64>,
) -> DbResult<Nutrition> {
    let nutrition = line_nutrition(lookup, line)?;
    Ok(nutrition.scale(effective_scaling_factor(factor)).sanitized().rounded())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;

    /// In-memory lookup for aggregation tests
    #[derive(Default)]
    pub(crate) struct FixtureLookup {
        pub ingredients: HashMap<i64, Nutrition>,
        pub units: HashMap<i64, f64>,
    }

    impl FixtureLookup {
        pub fn with_ingredient(mut self, id: i64, per_gram: Nutrition) -> Self {
            self.ingredients.insert(id, per_gram);
            self
        }

        pub fn with_unit(mut self, id: i64, grams_equivalent: f64) -> Self {
            self.units.insert(id, grams_equivalent);
            self
        }
    }

    impl NutritionLookup for FixtureLookup {
        fn ingredient_per_gram(&self, ingredient_id: i64) -> DbResult<Option<Nutrition>> {
            Ok(self.ingredients.get(&ingredient_id).copied())
        }

        fn custom_unit(&self, unit_id: i64) -> DbResult<Option<CustomUnit>> {
            Ok(self.units.get(&unit_id).map(|&grams_equivalent| CustomUnit {
                id: unit_id,
                ingredient_id: 0,
                unit_name: format!("unit-{}", unit_id),
                grams_equivalent,
                created_at: String::new(),
            }))
        }
    }

    fn grams(ingredient_id: i64, quantity: f64) -> Line {
        Line { ingredient_id, unit: UnitRef::Grams, quantity }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_worked_example() {
        // 2 units of 100 g at 1.5 kcal/g and 0.1 g protein/g, doubled
        let lookup = FixtureLookup::default()
            .with_ingredient(1, Nutrition { calories: 1.5, protein: 0.1, ..Default::default() })
            .with_unit(10, 100.0);
        let lines = [Line { ingredient_id: 1, unit: UnitRef::Custom(10), quantity: 2.0 }];

        let total = recipe_totals(&lookup, &lines, Some(2.0)).unwrap();
        assert_eq!(total.calories, 600.0);
        assert_eq!(total.protein, 40.0);
        assert_eq!(total.fats, 0.0);
    }

    #[test]
    fn test_linearity() {
        let a = Nutrition { calories: 2.0, protein: 0.25, carbs: 0.5, fats: 0.125, fiber: 0.0625 };
        let b = Nutrition { calories: 0.5, carbs: 0.75, ..Default::default() };
        let lookup = FixtureLookup::default().with_ingredient(1, a).with_ingredient(2, b);

        let total = accumulate(&lookup, &[grams(1, 40.0), grams(2, 8.0)]).unwrap();
        assert!(approx(total.calories, 2.0 * 40.0 + 0.5 * 8.0));
        assert!(approx(total.carbs, 0.5 * 40.0 + 0.75 * 8.0));
        assert!(approx(total.fiber, 0.0625 * 40.0));
    }

    #[test]
    fn test_scaling_is_proportional() {
        let lookup = FixtureLookup::default()
            .with_ingredient(1, Nutrition { calories: 3.0, protein: 0.2, ..Default::default() });
        let lines = [grams(1, 150.0)];

        let base = recipe_totals(&lookup, &lines, Some(1.0)).unwrap();
        for f in [0.5, 2.0, 3.0] {
            let scaled = recipe_totals(&lookup, &lines, Some(f)).unwrap();
            assert!(approx(scaled.calories, base.calories * f));
            assert!(approx(scaled.protein, base.protein * f));
        }
    }

    #[test]
    fn test_non_positive_factor_means_one() {
        let lookup = FixtureLookup::default()
            .with_ingredient(1, Nutrition { calories: 3.0, ..Default::default() });
        let lines = [grams(1, 100.0)];

        let base = recipe_totals(&lookup, &lines, Some(1.0)).unwrap();
        for f in [Some(0.0), Some(-2.0), Some(f64::NAN), None] {
            assert_eq!(recipe_totals(&lookup, &lines, f).unwrap(), base);
        }
    }

    #[test]
    fn test_null_unit_equals_one_gram_unit() {
        let lookup = FixtureLookup::default()
            .with_ingredient(1, Nutrition { calories: 1.2, protein: 0.3, ..Default::default() })
            .with_unit(5, 1.0);

        let plain = line_nutrition(&lookup, &grams(1, 250.0)).unwrap();
        let unit = line_nutrition(&lookup, &Line { ingredient_id: 1, unit: UnitRef::Custom(5), quantity: 250.0 }).unwrap();
        assert_eq!(plain, unit);
    }

    #[test]
    fn test_missing_ingredient_contributes_zero() {
        let lookup = FixtureLookup::default()
            .with_ingredient(1, Nutrition { calories: 2.0, ..Default::default() });

        assert!(line_nutrition(&lookup, &grams(99, 100.0)).unwrap().is_zero());

        let total = recipe_totals(&lookup, &[grams(99, 100.0), grams(1, 10.0)], None).unwrap();
        assert_eq!(total.calories, 20.0);
    }

    #[test]
    fn test_missing_unit_falls_back_to_grams() {
        let lookup = FixtureLookup::default()
            .with_ingredient(1, Nutrition { calories: 2.0, ..Default::default() });

        let n = line_nutrition(&lookup, &Line { ingredient_id: 1, unit: UnitRef::Custom(42), quantity: 30.0 }).unwrap();
        assert_eq!(n.calories, 60.0);
    }

    #[test]
    fn test_order_does_not_change_total() {
        let lookup = FixtureLookup::default()
            .with_ingredient(1, Nutrition { calories: 0.37, ..Default::default() })
            .with_ingredient(2, Nutrition { calories: 1.13, ..Default::default() })
            .with_ingredient(3, Nutrition { calories: 4.01, ..Default::default() });
        let forward = [grams(1, 33.0), grams(2, 17.0), grams(3, 9.0)];
        let backward = [grams(3, 9.0), grams(2, 17.0), grams(1, 33.0)];

        assert_eq!(
            recipe_totals(&lookup, &forward, None).unwrap(),
            recipe_totals(&lookup, &backward, None).unwrap()
        );
    }

    #[test]
    fn test_rounding_after_scaling_not_per_line() {
        // Each line is 0.004 kcal; per-line rounding would give 0
        let lookup = FixtureLookup::default()
            .with_ingredient(1, Nutrition { calories: 0.004, ..Default::default() });
        let lines = [grams(1, 1.0), grams(1, 1.0), grams(1, 1.0)];

        let total = recipe_totals(&lookup, &lines, Some(1.0)).unwrap();
        assert_eq!(total.calories, 0.01);
    }

    #[test]
    fn test_nan_quantity_never_reaches_total() {
        let lookup = FixtureLookup::default()
            .with_ingredient(1, Nutrition { calories: 2.0, ..Default::default() });

        let total = recipe_totals(&lookup, &[grams(1, f64::NAN), grams(1, 5.0)], None).unwrap();
        assert_eq!(total.calories, 10.0);
    }

    #[test]
    fn test_against_database() {
        use crate::db::Database;
        use crate::models::{CustomUnitCreate, IngredientCreate};

        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let flour = Ingredient::create(
                conn,
                &IngredientCreate {
                    name: "Flour".into(),
                    per_gram: Nutrition { calories: 3.64, protein: 0.1, ..Default::default() },
                },
            )?;
            let cup = CustomUnit::create(
                conn,
                &CustomUnitCreate { ingredient_id: flour.id, unit_name: "cup".into(), grams_equivalent: 125.0 },
            )?;

            let lines = [Line { ingredient_id: flour.id, unit: UnitRef::Custom(cup.id), quantity: 2.0 }];
            let total = recipe_totals(conn, &lines, Some(1.0))?;
            assert_eq!(total.calories, 910.0);
            assert_eq!(total.protein, 25.0);
            Ok(())
        })
        .unwrap();
    }
}
