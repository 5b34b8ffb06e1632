// src/domain/applications.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::generate_application_id;
use crate::dates::parse_date;
use crate::db::applications::{self as repo, ApplicationRecord, ApplicationStatus, NewApplication};
use crate::db::connection::Database;
use crate::db::dispatches::{self, DispatchRecord};
use crate::deadlines::calculator::career_plan_deadline_for_date;
use crate::deadlines::{
    derive_deadlines, validate_anchor, validate_override, CareerPlanDeadline, DeadlineStatus,
    DerivedDeadlines, OverrideRequest, PlanStrategy,
};
use crate::errors::{DeadlineError, ServerError};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub applicant_name: String,
    pub recipient_email: String,
    pub anchor_date: String,
    pub plan_strategy: String,
    pub plan_end_date: Option<String>,
}

/// Application as returned over HTTP: computed and effective deadlines side
/// by side, plus the day count against the effective application deadline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub id: String,
    pub applicant_name: String,
    pub recipient_email: String,
    pub application_status: &'static str,
    pub plan_strategy: &'static str,
    pub is_deadline_overridden: bool,
    pub computed: DerivedDeadlines,
    pub deadlines: DerivedDeadlines,
    pub deadline_status: DeadlineStatus,
    pub career_plan: CareerPlanDeadline,
    /// Automatic reminders already sent, tightest threshold last.
    pub reminders_sent: Vec<DispatchRecord>,
}

/// Trim + lowercase, minimal sanity check.
pub fn normalize_email(email: &str) -> Result<String, ServerError> {
    let e = email.trim().to_lowercase();
    if e.is_empty() || !e.contains('@') || e.starts_with('@') || e.ends_with('@') {
        return Err(ServerError::BadRequest("invalid email".into()));
    }
    Ok(e)
}

/// Reads the caller's plan-end rule. There is no default on purpose: the
/// two rules belong to different workflows.
pub fn parse_plan(strategy: &str, end_date: Option<&str>) -> Result<PlanStrategy, DeadlineError> {
    let end = match end_date.map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_date(raw).ok_or_else(|| {
            DeadlineError::InvalidInput("planEndDate is not a valid date".into())
        })?),
    };

    match strategy.trim() {
        "long_horizon" | "long" if end.is_some() => Err(DeadlineError::InvalidInput(
            "planEndDate only applies to the career_up_six_month plan".into(),
        )),
        "long_horizon" | "long" => Ok(PlanStrategy::LongHorizon),
        "career_up_six_month" | "six_month" => Ok(PlanStrategy::CareerUpSixMonth { end_date: end }),
        other => Err(DeadlineError::InvalidInput(format!(
            "unknown plan strategy {other:?} (expected long_horizon or career_up_six_month)"
        ))),
    }
}

fn parse_anchor(anchor: &str, now: DateTime<Utc>) -> Result<chrono::NaiveDate, ServerError> {
    validate_anchor(anchor, now).into_result()?;
    parse_date(anchor)
        .ok_or_else(|| ServerError::InvalidInput("anchor date is not a valid date".into()))
}

fn build_view(
    rec: ApplicationRecord,
    sent: Vec<DispatchRecord>,
    now: DateTime<Utc>,
) -> Result<ApplicationView, ServerError> {
    let computed = rec.computed()?;
    let deadlines = rec.effective()?;
    let career_plan = career_plan_deadline_for_date(rec.anchor_date, now)?;

    Ok(ApplicationView {
        application_status: rec.status.as_str(),
        plan_strategy: rec.plan.as_str(),
        is_deadline_overridden: rec.is_deadline_overridden,
        deadline_status: DeadlineStatus::at(deadlines.application_deadline_end, now),
        computed,
        deadlines,
        career_plan,
        reminders_sent: sent,
        id: rec.id,
        applicant_name: rec.applicant_name,
        recipient_email: rec.recipient_email,
    })
}

fn load_view(db: &Database, id: &str, now: DateTime<Utc>) -> Result<ApplicationView, ServerError> {
    let (rec, sent) = db.with_conn(|conn| {
        let rec = repo::get_application(conn, id)?.ok_or(ServerError::NotFound)?;
        let sent = dispatches::list_dispatches(conn, id)?;
        Ok((rec, sent))
    })?;
    build_view(rec, sent, now)
}

/// Validates the anchor and plan, derives the deadlines, and stores the
/// new application with its derived-date cache.
pub fn create_application(
    db: &Database,
    req: &CreateApplicationRequest,
    now: DateTime<Utc>,
) -> Result<ApplicationView, ServerError> {
    let applicant_name = req.applicant_name.trim();
    if applicant_name.is_empty() {
        return Err(ServerError::BadRequest("missing applicantName".into()));
    }
    let recipient_email = normalize_email(&req.recipient_email)?;
    let anchor_date = parse_anchor(&req.anchor_date, now)?;
    let plan = parse_plan(&req.plan_strategy, req.plan_end_date.as_deref())?;
    let derived = derive_deadlines(anchor_date, plan)?;

    let new_app = NewApplication {
        applicant_name: applicant_name.to_string(),
        recipient_email,
        anchor_date,
        plan,
    };
    let id = generate_application_id();
    db.with_conn(|conn| repo::insert_application(conn, &id, &new_app, &derived, now.timestamp()))?;

    tracing::info!(application_id = %id, anchor = %anchor_date, plan = plan.as_str(), "application created");
    load_view(db, &id, now)
}

pub fn get_application(
    db: &Database,
    id: &str,
    now: DateTime<Utc>,
) -> Result<ApplicationView, ServerError> {
    load_view(db, id, now)
}

pub fn list_applications(
    db: &Database,
    now: DateTime<Utc>,
) -> Result<Vec<ApplicationView>, ServerError> {
    let rows = db.with_conn(|conn| {
        let mut rows = Vec::new();
        for rec in repo::list_applications(conn)? {
            let sent = dispatches::list_dispatches(conn, &rec.id)?;
            rows.push((rec, sent));
        }
        Ok(rows)
    })?;

    rows.into_iter()
        .map(|(rec, sent)| build_view(rec, sent, now))
        .collect()
}

/// Re-edit of the anchor event. Recomputes with the stored plan strategy;
/// an existing override stays in place.
pub fn reedit_anchor(
    db: &Database,
    id: &str,
    anchor: &str,
    now: DateTime<Utc>,
) -> Result<ApplicationView, ServerError> {
    let anchor_date = parse_anchor(anchor, now)?;

    db.with_conn(|conn| {
        let rec = repo::get_application(conn, id)?.ok_or(ServerError::NotFound)?;
        let derived = derive_deadlines(anchor_date, rec.plan)?;
        repo::update_anchor(conn, id, anchor_date, &derived, now.timestamp())?;
        Ok(())
    })?;

    tracing::info!(application_id = %id, anchor = %anchor_date, "anchor re-edited");
    load_view(db, id, now)
}

pub fn update_override(
    db: &Database,
    id: &str,
    req: &OverrideRequest,
    now: DateTime<Utc>,
) -> Result<ApplicationView, ServerError> {
    db.with_conn(|conn| {
        let rec = repo::get_application(conn, id)?.ok_or(ServerError::NotFound)?;
        let ov = validate_override(req, &rec.computed()?)?;
        repo::set_override(conn, id, ov.as_ref(), now.timestamp())?;
        Ok(())
    })?;

    tracing::info!(
        application_id = %id,
        overridden = req.is_deadline_overridden,
        "deadline override updated"
    );
    load_view(db, id, now)
}

pub fn update_status(
    db: &Database,
    id: &str,
    status: &str,
    now: DateTime<Utc>,
) -> Result<ApplicationView, ServerError> {
    let status = ApplicationStatus::parse(status.trim())
        .ok_or_else(|| ServerError::BadRequest(format!("unknown status {status:?}")))?;

    let found = db.with_conn(|conn| repo::set_status(conn, id, status, now.timestamp()))?;
    if !found {
        return Err(ServerError::NotFound);
    }
    load_view(db, id, now)
}

pub fn delete_application(db: &Database, id: &str) -> Result<(), ServerError> {
    let found = db.with_conn(|conn| repo::delete_application(conn, id))?;
    if !found {
        return Err(ServerError::NotFound);
    }
    tracing::info!(application_id = %id, "application deleted");
    Ok(())
}
