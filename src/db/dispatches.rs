// src/db/dispatches.rs
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::errors::ServerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRecord {
    pub threshold_days: i64,
    pub sent_at: i64,
}

pub fn has_dispatch(
    conn: &Connection,
    application_id: &str,
    threshold_days: i64,
) -> Result<bool, ServerError> {
    let count: i64 = conn
        .query_row(
            "select count(*) from reminder_dispatches where application_id = ? and threshold_days = ?",
            params![application_id, threshold_days],
            |r| r.get(0),
        )
        .map_err(|e| ServerError::DbError(format!("select dispatch failed: {e}")))?;
    Ok(count > 0)
}

/// Create-if-absent on (application_id, threshold_days). Returns true when
/// this call inserted the row; a concurrent writer that got there first
/// leaves it untouched and this returns false.
pub fn record_dispatch(
    conn: &Connection,
    application_id: &str,
    threshold_days: i64,
    sent_at: i64,
) -> Result<bool, ServerError> {
    let n = conn
        .execute(
            "insert or ignore into reminder_dispatches (application_id, threshold_days, sent_at) values (?, ?, ?)",
            params![application_id, threshold_days, sent_at],
        )
        .map_err(|e| ServerError::DbError(format!("insert dispatch failed: {e}")))?;
    Ok(n == 1)
}

pub fn list_dispatches(
    conn: &Connection,
    application_id: &str,
) -> Result<Vec<DispatchRecord>, ServerError> {
    let mut stmt = conn
        .prepare(
            "select threshold_days, sent_at from reminder_dispatches where application_id = ? order by threshold_days desc",
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![application_id], |r| {
            Ok(DispatchRecord {
                threshold_days: r.get(0)?,
                sent_at: r.get(1)?,
            })
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}
