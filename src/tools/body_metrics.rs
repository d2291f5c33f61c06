//! Body Metrics MCP Tools

use serde::Serialize;

use crate::db::Database;
use crate::models::{BodyMetrics, DailyBodyMetrics};
use super::{validate_date, DeleteResponse};

#[derive(Debug, Serialize)]
pub struct ListBodyMetricsResponse {
    pub entries: Vec<DailyBodyMetrics>,
    pub count: usize,
}

/// Set the provided readings for a date
pub fn save_body_metrics(db: &Database, date: &str, metrics: BodyMetrics) -> Result<DailyBodyMetrics, String> {
    let date = validate_date(date)?;
    metrics.validate()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    DailyBodyMetrics::upsert(&conn, &date, &metrics)
        .map_err(|e| format!("Failed to save body metrics: {}", e))
}

pub fn get_body_metrics(db: &Database, date: &str) -> Result<Option<DailyBodyMetrics>, String> {
    let date = validate_date(date)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    DailyBodyMetrics::get_by_date(&conn, &date)
        .map_err(|e| format!("Failed to get body metrics: {}", e))
}

/// List readings, newest first
pub fn list_body_metrics(
    db: &Database,
    start_date: Option<&str>,
    end_date: Option<&str>,
    limit: i64,
) -> Result<ListBodyMetricsResponse, String> {
    let start_date = start_date.map(validate_date).transpose()?;
    let end_date = end_date.map(validate_date).transpose()?;
    let limit = limit.clamp(1, 366);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let entries = DailyBodyMetrics::list(&conn, start_date.as_deref(), end_date.as_deref(), limit)
        .map_err(|e| format!("Failed to list body metrics: {}", e))?;

    Ok(ListBodyMetricsResponse {
        count: entries.len(),
        entries,
    })
}

pub fn update_body_metrics(db: &Database, id: i64, metrics: BodyMetrics) -> Result<Option<DailyBodyMetrics>, String> {
    metrics.validate()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    DailyBodyMetrics::update(&conn, id, &metrics)
        .map_err(|e| format!("Failed to update body metrics: {}", e))
}

pub fn delete_body_metrics(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = DailyBodyMetrics::delete(&conn, id)
        .map_err(|e| format!("Failed to delete body metrics: {}", e))?;

    Ok(deleted.then_some(DeleteResponse {
        success: true,
        deleted_id: id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_rejects_out_of_range_percentage() {
        let db = Database::in_memory().unwrap();
        let err = save_body_metrics(&db, "2025-08-01", BodyMetrics { body_fat: Some(120.0), ..Default::default() })
            .unwrap_err();
        assert!(err.contains("body_fat"));
        assert!(get_body_metrics(&db, "2025-08-01").unwrap().is_none());
    }

    #[test]
    fn test_save_update_list_delete() {
        let db = Database::in_memory().unwrap();
        let saved = save_body_metrics(&db, "2025-08-01", BodyMetrics { weight: Some(70.4), ..Default::default() }).unwrap();
        save_body_metrics(&db, "2025-08-03", BodyMetrics { weight: Some(70.1), ..Default::default() }).unwrap();

        let updated = update_body_metrics(&db, saved.id, BodyMetrics { bmi: Some(22.9), ..Default::default() })
            .unwrap()
            .unwrap();
        assert_eq!(updated.metrics.weight, Some(70.4));
        assert_eq!(updated.metrics.bmi, Some(22.9));

        let listed = list_body_metrics(&db, None, None, 10).unwrap();
        assert_eq!(listed.entries[0].date, "2025-08-03");

        assert!(delete_body_metrics(&db, saved.id).unwrap().is_some());
        assert_eq!(list_body_metrics(&db, None, None, 10).unwrap().count, 1);
    }
}
