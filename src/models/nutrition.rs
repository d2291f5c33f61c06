//! Shared nutrition data structure
//!
//! Used for per-gram ingredient coefficients, recipe totals and daily logs.

use serde::{Deserialize, Serialize};

use crate::db::coerce::round2;

/// Nutritional values. Per gram on an ingredient, absolute everywhere else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64, // grams
    pub carbs: f64,   // grams
    pub fats: f64,    // grams
    pub fiber: f64,   // grams
}

impl Nutrition {
    /// Create a new Nutrition with all zeros
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            protein: self.protein * multiplier,
            carbs: self.carbs * multiplier,
            fats: self.fats * multiplier,
            fiber: self.fiber * multiplier,
        }
    }

    /// Add another nutrition to this one
    pub fn add(&self, other: &Nutrition) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fats: self.fats + other.fats,
            fiber: self.fiber + other.fiber,
        }
    }

    /// Round every field to two decimal places
    pub fn rounded(&self) -> Self {
        Self {
            calories: round2(self.calories),
            protein: round2(self.protein),
            carbs: round2(self.carbs),
            fats: round2(self.fats),
            fiber: round2(self.fiber),
        }
    }

    /// Replace non-finite fields with zero
    pub fn sanitized(&self) -> Self {
        let clean = |x: f64| if x.is_finite() { x } else { 0.0 };
        Self {
            calories: clean(self.calories),
            protein: clean(self.protein),
            carbs: clean(self.carbs),
            fats: clean(self.fats),
            fiber: clean(self.fiber),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Name of the first negative field, if any
    pub fn first_negative(&self) -> Option<&'static str> {
        [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fats", self.fats),
            ("fiber", self.fiber),
        ]
        .into_iter()
        .find(|(_, v)| *v < 0.0)
        .map(|(name, _)| name)
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for Nutrition {
    type Output = Nutrition;

    fn mul(self, multiplier: f64) -> Nutrition {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}
