//! Storage-boundary coercion
//!
//! SQLite columns are dynamically typed; a REAL column can come back as an
//! integer, text or NULL. Rows are decoded through these helpers so that
//! malformed numeric fields default instead of leaking NaN into totals.

use rusqlite::types::Value;
use rusqlite::Row;

/// Coerce a dynamically typed value to a finite number
pub fn to_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Integer(i) => *i as f64,
        Value::Real(r) => *r,
        Value::Text(s) => s.trim().parse::<f64>().ok()?,
        Value::Null | Value::Blob(_) => return None,
    };
    n.is_finite().then_some(n)
}

/// Read a numeric column, defaulting missing or malformed values to `0.0`
pub fn f64_or_zero(row: &Row, column: &str) -> rusqlite::Result<f64> {
    Ok(opt_f64(row, column)?.unwrap_or(0.0))
}

/// Read a nullable numeric column, mapping malformed values to `None`
pub fn opt_f64(row: &Row, column: &str) -> rusqlite::Result<Option<f64>> {
    let value: Value = row.get(column)?;
    Ok(to_f64(&value))
}

/// Scaling factor: absent, non-finite or non-positive means `1.0`
pub fn scaling_factor(value: Option<f64>) -> f64 {
    match value {
        Some(f) if f.is_finite() && f > 0.0 => f,
        _ => 1.0,
    }
}

/// Round to two decimal places
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_f64_variants() {
        assert_eq!(to_f64(&Value::Integer(3)), Some(3.0));
        assert_eq!(to_f64(&Value::Real(1.25)), Some(1.25));
        assert_eq!(to_f64(&Value::Text(" 2.5 ".into())), Some(2.5));
        assert_eq!(to_f64(&Value::Text("lots".into())), None);
        assert_eq!(to_f64(&Value::Real(f64::NAN)), None);
        assert_eq!(to_f64(&Value::Real(f64::INFINITY)), None);
        assert_eq!(to_f64(&Value::Null), None);
    }

    #[test]
    fn test_scaling_factor_fallback() {
        assert_eq!(scaling_factor(None), 1.0);
        assert_eq!(scaling_factor(Some(0.0)), 1.0);
        assert_eq!(scaling_factor(Some(-2.0)), 1.0);
        assert_eq!(scaling_factor(Some(f64::NAN)), 1.0);
        assert_eq!(scaling_factor(Some(2.5)), 2.5);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(599.999), 600.0);
        assert_eq!(round2(-1.234), -1.23);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_row_decoding_defaults_malformed_columns() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let (a, b, c) = conn
            .query_row("SELECT 'abc' AS a, NULL AS b, 4 AS c", [], |row| {
                Ok((
                    f64_or_zero(row, "a")?,
                    opt_f64(row, "b")?,
                    f64_or_zero(row, "c")?,
                ))
            })
            .unwrap();
        assert_eq!(a, 0.0);
        assert_eq!(b, None);
        assert_eq!(c, 4.0);
    }
}
