// src/deadlines/calculator.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::{add_days, add_months, add_years, days_until, parse_date};
use crate::errors::DeadlineError;

/// Months from the anchor until the six-month payment period closes.
pub const PAYMENT_END_MONTHS: i32 = 7;
/// Length of the application window that opens the day after payment end.
pub const APPLICATION_WINDOW_MONTHS: i32 = 2;
pub const LONG_HORIZON_YEARS: i32 = 5;
pub const CAREER_UP_PLAN_MONTHS: i32 = 6;
/// `is_urgent` covers 0..=URGENT_WINDOW_DAYS days remaining.
pub const URGENT_WINDOW_DAYS: i64 = 14;

/// How the plan end date is derived. The two workflows use different rules,
/// so the caller always picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanStrategy {
    /// Plan/commitment horizon: anchor + 5 years.
    LongHorizon,
    /// Career-up plan: anchor + 6 months unless an explicit end date is given.
    CareerUpSixMonth {
        #[serde(default, rename = "endDate")]
        end_date: Option<NaiveDate>,
    },
}

impl PlanStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStrategy::LongHorizon => "long_horizon",
            PlanStrategy::CareerUpSixMonth { .. } => "career_up_six_month",
        }
    }

    /// Rebuilds a strategy from its stored name and optional explicit end.
    pub fn from_parts(name: &str, end_date: Option<NaiveDate>) -> Option<Self> {
        match name {
            "long_horizon" => Some(PlanStrategy::LongHorizon),
            "career_up_six_month" => Some(PlanStrategy::CareerUpSixMonth { end_date }),
            _ => None,
        }
    }

    pub fn explicit_end(&self) -> Option<NaiveDate> {
        match self {
            PlanStrategy::LongHorizon => None,
            PlanStrategy::CareerUpSixMonth { end_date } => *end_date,
        }
    }

    fn plan_end(&self, anchor: NaiveDate) -> Option<NaiveDate> {
        match self {
            PlanStrategy::LongHorizon => add_years(anchor, LONG_HORIZON_YEARS),
            PlanStrategy::CareerUpSixMonth { end_date: Some(end) } => Some(*end),
            PlanStrategy::CareerUpSixMonth { end_date: None } => {
                add_months(anchor, CAREER_UP_PLAN_MONTHS)
            }
        }
    }
}

/// Ordered urgency bands for the days left until the application deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Overdue,
    Critical,
    Warning,
    Caution,
    Normal,
}

impl UrgencyLevel {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d < 0 => UrgencyLevel::Overdue,
            0..=7 => UrgencyLevel::Critical,
            8..=14 => UrgencyLevel::Warning,
            15..=30 => UrgencyLevel::Caution,
            _ => UrgencyLevel::Normal,
        }
    }
}

/// Two-week rule. Overdue deadlines are not "urgent" under it.
pub fn is_urgent(days_until_deadline: i64) -> bool {
    (0..=URGENT_WINDOW_DAYS).contains(&days_until_deadline)
}

/// Every date derived from one anchor event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedDeadlines {
    pub anchor_date: NaiveDate,
    pub plan_end_date: NaiveDate,
    pub six_months_payment_end: NaiveDate,
    pub application_deadline_start: NaiveDate,
    pub application_deadline_end: NaiveDate,
    pub career_plan_deadline: NaiveDate,
}

/// Day count and urgency of an application deadline at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineStatus {
    pub days_until_deadline: i64,
    pub is_urgent: bool,
    pub urgency: UrgencyLevel,
}

impl DeadlineStatus {
    pub fn at(application_deadline_end: NaiveDate, now: DateTime<Utc>) -> Self {
        let days = days_until(application_deadline_end, now);
        Self {
            days_until_deadline: days,
            is_urgent: is_urgent(days),
            urgency: UrgencyLevel::from_days(days),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineReport {
    #[serde(flatten)]
    pub deadlines: DerivedDeadlines,
    #[serde(flatten)]
    pub status: DeadlineStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPlanDeadline {
    pub deadline_date: NaiveDate,
    pub is_overdue: bool,
    pub days_until_deadline: i64,
}

fn out_of_range(anchor: NaiveDate) -> DeadlineError {
    DeadlineError::InvalidInput(format!("anchor date {anchor} is out of the supported range"))
}

fn parse_anchor(anchor: &str) -> Result<NaiveDate, DeadlineError> {
    parse_date(anchor)
        .ok_or_else(|| DeadlineError::InvalidInput(format!("not a valid date: {anchor:?}")))
}

/// Derives all dates from the anchor. Independent of the current time.
pub fn derive_deadlines(
    anchor: NaiveDate,
    plan: PlanStrategy,
) -> Result<DerivedDeadlines, DeadlineError> {
    let plan_end_date = plan.plan_end(anchor).ok_or_else(|| out_of_range(anchor))?;
    let six_months_payment_end =
        add_months(anchor, PAYMENT_END_MONTHS).ok_or_else(|| out_of_range(anchor))?;
    let application_deadline_start =
        add_days(six_months_payment_end, 1).ok_or_else(|| out_of_range(anchor))?;
    let application_deadline_end = add_months(application_deadline_start, APPLICATION_WINDOW_MONTHS)
        .ok_or_else(|| out_of_range(anchor))?;
    let career_plan_deadline = add_days(anchor, -1).ok_or_else(|| out_of_range(anchor))?;

    Ok(DerivedDeadlines {
        anchor_date: anchor,
        plan_end_date,
        six_months_payment_end,
        application_deadline_start,
        application_deadline_end,
        career_plan_deadline,
    })
}

pub fn compute_for_date(
    anchor: NaiveDate,
    now: DateTime<Utc>,
    plan: PlanStrategy,
) -> Result<DeadlineReport, DeadlineError> {
    let deadlines = derive_deadlines(anchor, plan)?;
    Ok(DeadlineReport {
        status: DeadlineStatus::at(deadlines.application_deadline_end, now),
        deadlines,
    })
}

/// Parses the anchor and computes the full deadline report at `now`.
pub fn compute(
    anchor: &str,
    now: DateTime<Utc>,
    plan: PlanStrategy,
) -> Result<DeadlineReport, DeadlineError> {
    compute_for_date(parse_anchor(anchor)?, now, plan)
}

/// Plan-filing deadline: the day before the anchor event.
pub fn compute_career_plan_deadline(
    anchor: &str,
    now: DateTime<Utc>,
) -> Result<CareerPlanDeadline, DeadlineError> {
    let anchor = parse_anchor(anchor)?;
    career_plan_deadline_for_date(anchor, now)
}

pub fn career_plan_deadline_for_date(
    anchor: NaiveDate,
    now: DateTime<Utc>,
) -> Result<CareerPlanDeadline, DeadlineError> {
    let deadline_date = add_days(anchor, -1).ok_or_else(|| out_of_range(anchor))?;
    let days = days_until(deadline_date, now);
    Ok(CareerPlanDeadline {
        deadline_date,
        is_overdue: days < 0,
        days_until_deadline: days,
    })
}
