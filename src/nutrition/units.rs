//! Unit references
//!
//! A quantity is either plain grams or a count of some ingredient's custom unit.

use serde::{Deserialize, Serialize};

/// What a line's quantity is measured in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitRef {
    #[default]
    Grams,
    Custom(i64),
}

impl UnitRef {
    /// Storage form: `NULL` means grams
    pub fn from_unit_id(unit_id: Option<i64>) -> Self {
        match unit_id {
            Some(id) => UnitRef::Custom(id),
            None => UnitRef::Grams,
        }
    }

    pub fn unit_id(&self) -> Option<i64> {
        match self {
            UnitRef::Grams => None,
            UnitRef::Custom(id) => Some(*id),
        }
    }

    /// Parse a tool argument: empty, `"g"`, `"gram"` or `"grams"` mean grams,
    /// anything else must be a custom unit id.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "g" | "gram" | "grams" => Some(UnitRef::Grams),
            _ => trimmed.parse::<i64>().ok().map(UnitRef::Custom),
        }
    }
}
