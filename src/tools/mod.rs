//! FitTrack Tools module
//!
//! Tool implementations behind the MCP surface. Each takes the `Database`
//! explicitly and returns a serializable response or an error message.

use chrono::NaiveDate;

pub mod body_metrics;
pub mod daily;
pub mod habits;
pub mod ingredients;
pub mod recipes;
pub mod status;
pub mod workouts;

/// Require an ISO calendar date (`YYYY-MM-DD`)
pub fn validate_date(date: &str) -> Result<String, String> {
    let date = date.trim();
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| format!("Invalid date '{}': expected YYYY-MM-DD", date))
}

/// Require a calendar month (`YYYY-MM`)
pub fn validate_month(month: &str) -> Result<String, String> {
    let month = month.trim();
    NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m").to_string())
        .map_err(|_| format!("Invalid month '{}': expected YYYY-MM", month))
}

/// Require a non-empty trimmed name
pub(crate) fn require_name(name: &str, what: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("{} name cannot be empty", what));
    }
    Ok(name.to_string())
}

/// Generic delete response
#[derive(Debug, serde::Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_date() {
        assert_eq!(validate_date(" 2025-02-28 ").unwrap(), "2025-02-28");
        assert!(validate_date("2025-02-30").is_err());
        assert!(validate_date("28/02/2025").is_err());
    }

    #[test]
    fn test_validate_month() {
        assert_eq!(validate_month("2025-02").unwrap(), "2025-02");
        assert!(validate_month("2025-13").is_err());
        assert!(validate_month("Feb").is_err());
    }

    #[test]
    fn test_require_name() {
        assert_eq!(require_name("  Oats ", "Ingredient").unwrap(), "Oats");
        assert!(require_name("   ", "Ingredient").is_err());
    }
}
