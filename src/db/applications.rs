// src/db/applications.rs
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::deadlines::{derive_deadlines, effective_deadlines, DeadlineOverride, DerivedDeadlines, PlanStrategy};
use crate::errors::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationStatus {
    Active,
    Completed,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Active => "active",
            ApplicationStatus::Completed => "completed",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ApplicationStatus::Active),
            "completed" => Some(ApplicationStatus::Completed),
            "withdrawn" => Some(ApplicationStatus::Withdrawn),
            _ => None,
        }
    }
}

pub struct NewApplication {
    pub applicant_name: String,
    pub recipient_email: String,
    pub anchor_date: NaiveDate,
    pub plan: PlanStrategy,
}

#[derive(Debug, Clone)]
pub struct ApplicationRecord {
    pub id: String,
    pub applicant_name: String,
    pub recipient_email: String,
    pub anchor_date: NaiveDate,
    pub plan: PlanStrategy,
    pub status: ApplicationStatus,
    pub is_deadline_overridden: bool,
    pub overrides: DeadlineOverride,
    pub last_evaluated_days: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ApplicationRecord {
    /// Freshly derived from the anchor; the cached columns are never read back.
    pub fn computed(&self) -> Result<DerivedDeadlines, ServerError> {
        derive_deadlines(self.anchor_date, self.plan)
            .map_err(|e| ServerError::DbError(format!("stored anchor for {} unusable: {e}", self.id)))
    }

    pub fn effective(&self) -> Result<DerivedDeadlines, ServerError> {
        Ok(effective_deadlines(
            self.computed()?,
            self.is_deadline_overridden,
            &self.overrides,
        ))
    }
}

const SELECT_COLUMNS: &str = "
    id, applicant_name, recipient_email, anchor_date, plan_strategy, plan_end_explicit,
    status, is_deadline_overridden,
    override_six_months_payment_end, override_application_deadline_start,
    override_application_deadline_end, override_plan_end_date,
    last_evaluated_days, created_at, updated_at";

fn map_row(r: &Row<'_>) -> rusqlite::Result<ApplicationRecord> {
    let strategy: String = r.get(4)?;
    let explicit_end: Option<NaiveDate> = r.get(5)?;
    let plan = PlanStrategy::from_parts(&strategy, explicit_end).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(4, format!("plan_strategy={strategy}"), rusqlite::types::Type::Text)
    })?;

    let status: String = r.get(6)?;
    let status = ApplicationStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(6, format!("status={status}"), rusqlite::types::Type::Text)
    })?;

    Ok(ApplicationRecord {
        id: r.get(0)?,
        applicant_name: r.get(1)?,
        recipient_email: r.get(2)?,
        anchor_date: r.get(3)?,
        plan,
        status,
        is_deadline_overridden: r.get(7)?,
        overrides: DeadlineOverride {
            six_months_payment_end: r.get(8)?,
            application_deadline_start: r.get(9)?,
            application_deadline_end: r.get(10)?,
            plan_end_date: r.get(11)?,
        },
        last_evaluated_days: r.get(12)?,
        created_at: r.get(13)?,
        updated_at: r.get(14)?,
    })
}

pub fn insert_application(
    conn: &Connection,
    id: &str,
    app: &NewApplication,
    derived: &DerivedDeadlines,
    now: i64,
) -> Result<(), ServerError> {
    conn.execute(
        r#"
        insert into applications (
            id, applicant_name, recipient_email, anchor_date, plan_strategy, plan_end_explicit,
            status, plan_end_date, six_months_payment_end, application_deadline_start,
            application_deadline_end, career_plan_deadline, created_at, updated_at
        ) values (?, ?, ?, ?, ?, ?, 'active', ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            id,
            app.applicant_name,
            app.recipient_email,
            app.anchor_date,
            app.plan.as_str(),
            app.plan.explicit_end(),
            derived.plan_end_date,
            derived.six_months_payment_end,
            derived.application_deadline_start,
            derived.application_deadline_end,
            derived.career_plan_deadline,
            now,
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert application failed: {e}")))?;
    Ok(())
}

pub fn get_application(conn: &Connection, id: &str) -> Result<Option<ApplicationRecord>, ServerError> {
    conn.query_row(
        &format!("select {SELECT_COLUMNS} from applications where id = ?"),
        params![id],
        map_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select application failed: {e}")))
}

pub fn list_applications(conn: &Connection) -> Result<Vec<ApplicationRecord>, ServerError> {
    let mut stmt = conn
        .prepare(&format!(
            "select {SELECT_COLUMNS} from applications order by created_at, id"
        ))
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map([], map_row)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

/// Ids of applications the scheduler should look at.
pub fn list_active_ids(conn: &Connection) -> Result<Vec<String>, ServerError> {
    let mut stmt = conn
        .prepare("select id from applications where status = 'active' order by created_at, id")
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map([], |r| r.get(0))
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut ids = Vec::new();
    for r in rows {
        ids.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(ids)
}

/// Re-edit of the anchor: stores the new anchor and refreshes the cache.
/// Returns false when the application does not exist.
pub fn update_anchor(
    conn: &Connection,
    id: &str,
    anchor: NaiveDate,
    derived: &DerivedDeadlines,
    now: i64,
) -> Result<bool, ServerError> {
    let n = conn
        .execute(
            r#"
            update applications set
                anchor_date = ?, plan_end_date = ?, six_months_payment_end = ?,
                application_deadline_start = ?, application_deadline_end = ?,
                career_plan_deadline = ?, updated_at = ?
            where id = ?
            "#,
            params![
                anchor,
                derived.plan_end_date,
                derived.six_months_payment_end,
                derived.application_deadline_start,
                derived.application_deadline_end,
                derived.career_plan_deadline,
                now,
                id
            ],
        )
        .map_err(|e| ServerError::DbError(format!("update anchor failed: {e}")))?;
    Ok(n == 1)
}

/// `None` clears the override flag and the stored replacement dates.
pub fn set_override(
    conn: &Connection,
    id: &str,
    ov: Option<&DeadlineOverride>,
    now: i64,
) -> Result<bool, ServerError> {
    let empty = DeadlineOverride::default();
    let values = ov.unwrap_or(&empty);

    let n = conn
        .execute(
            r#"
            update applications set
                is_deadline_overridden = ?,
                override_six_months_payment_end = ?,
                override_application_deadline_start = ?,
                override_application_deadline_end = ?,
                override_plan_end_date = ?,
                updated_at = ?
            where id = ?
            "#,
            params![
                ov.is_some(),
                values.six_months_payment_end,
                values.application_deadline_start,
                values.application_deadline_end,
                values.plan_end_date,
                now,
                id
            ],
        )
        .map_err(|e| ServerError::DbError(format!("update override failed: {e}")))?;
    Ok(n == 1)
}

pub fn set_status(
    conn: &Connection,
    id: &str,
    status: ApplicationStatus,
    now: i64,
) -> Result<bool, ServerError> {
    let n = conn
        .execute(
            "update applications set status = ?, updated_at = ? where id = ?",
            params![status.as_str(), now, id],
        )
        .map_err(|e| ServerError::DbError(format!("update status failed: {e}")))?;
    Ok(n == 1)
}

pub fn save_watermark(conn: &Connection, id: &str, days_remaining: i64) -> Result<(), ServerError> {
    conn.execute(
        "update applications set last_evaluated_days = ? where id = ?",
        params![days_remaining, id],
    )
    .map_err(|e| ServerError::DbError(format!("update watermark failed: {e}")))?;
    Ok(())
}

/// Deletes the application; its dispatch records go with it (FK cascade).
pub fn delete_application(conn: &Connection, id: &str) -> Result<bool, ServerError> {
    let n = conn
        .execute("delete from applications where id = ?", params![id])
        .map_err(|e| ServerError::DbError(format!("delete application failed: {e}")))?;
    Ok(n == 1)
}
