// src/deadlines/validator.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::calculator::DerivedDeadlines;
use super::overrides::DeadlineOverride;
use crate::dates::{add_months, add_years, format_iso, is_valid_date, parse_date};
use crate::errors::DeadlineError;

/// How far ahead an anchor may be registered.
pub const MAX_FUTURE_MONTHS: i32 = 1;
/// How far back an anchor is still actionable.
pub const MAX_PAST_YEARS: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AnchorValidation {
    fn ok() -> Self {
        Self {
            is_valid: true,
            error_message: None,
        }
    }

    fn rejected(msg: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error_message: Some(msg.into()),
        }
    }

    pub fn into_result(self) -> Result<(), DeadlineError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(DeadlineError::InvalidInput(
                self.error_message.unwrap_or_default(),
            ))
        }
    }
}

/// Accepts anchors inside `[today - 2 years, today + 1 month]`, both bounds
/// inclusive and recomputed from `now` on every call.
pub fn validate_anchor(anchor: &str, now: DateTime<Utc>) -> AnchorValidation {
    let Some(date) = parse_date(anchor) else {
        return AnchorValidation::rejected("anchor date is not a valid date");
    };
    validate_anchor_date(date, now)
}

pub fn validate_anchor_date(date: NaiveDate, now: DateTime<Utc>) -> AnchorValidation {
    let today = now.date_naive();

    // Bounds outside chrono's range cannot be exceeded by a parsed date.
    if let Some(latest) = add_months(today, MAX_FUTURE_MONTHS) {
        if date > latest {
            return AnchorValidation::rejected(format!(
                "anchor date is too far ahead to register yet (latest allowed: {})",
                format_iso(latest)
            ));
        }
    }
    if let Some(earliest) = add_years(today, -MAX_PAST_YEARS) {
        if date < earliest {
            return AnchorValidation::rejected(format!(
                "anchor date is too old to still be actionable (earliest allowed: {})",
                format_iso(earliest)
            ));
        }
    }

    AnchorValidation::ok()
}

/// Raw override edit as submitted by an admin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRequest {
    pub is_deadline_overridden: bool,
    pub six_months_payment_end: Option<String>,
    pub application_deadline_start: Option<String>,
    pub application_deadline_end: Option<String>,
    pub plan_end_date: Option<String>,
}

fn parse_field(name: &str, value: &Option<String>) -> Result<Option<NaiveDate>, DeadlineError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) if !is_valid_date(raw) => Err(DeadlineError::InvalidInput(format!(
            "{name} is not a valid date"
        ))),
        Some(raw) => Ok(parse_date(raw)),
    }
}

/// Checks an override against the computed deadlines it will replace.
///
/// Returns `None` when the request clears the override.
pub fn validate_override(
    req: &OverrideRequest,
    computed: &DerivedDeadlines,
) -> Result<Option<DeadlineOverride>, DeadlineError> {
    if !req.is_deadline_overridden {
        return Ok(None);
    }

    let ov = DeadlineOverride {
        six_months_payment_end: parse_field("sixMonthsPaymentEnd", &req.six_months_payment_end)?,
        application_deadline_start: parse_field(
            "applicationDeadlineStart",
            &req.application_deadline_start,
        )?,
        application_deadline_end: parse_field(
            "applicationDeadlineEnd",
            &req.application_deadline_end,
        )?,
        plan_end_date: parse_field("planEndDate", &req.plan_end_date)?,
    };

    if ov.is_empty() {
        return Err(DeadlineError::InvalidInput(
            "override requested without any replacement date".into(),
        ));
    }

    let eff = ov.apply(*computed);
    if eff.application_deadline_start > eff.application_deadline_end {
        return Err(DeadlineError::InvalidInput(
            "applicationDeadlineStart must not be after applicationDeadlineEnd".into(),
        ));
    }
    if eff.six_months_payment_end >= eff.application_deadline_start {
        return Err(DeadlineError::InvalidInput(
            "sixMonthsPaymentEnd must be before applicationDeadlineStart".into(),
        ));
    }
    if eff.plan_end_date < eff.anchor_date {
        return Err(DeadlineError::InvalidInput(
            "planEndDate must not be before the anchor date".into(),
        ));
    }

    Ok(Some(ov))
}
