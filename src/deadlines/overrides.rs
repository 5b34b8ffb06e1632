// src/deadlines/overrides.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calculator::DerivedDeadlines;

/// Admin-supplied replacements for computed dates. Fields left `None` keep
/// the computed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineOverride {
    pub six_months_payment_end: Option<NaiveDate>,
    pub application_deadline_start: Option<NaiveDate>,
    pub application_deadline_end: Option<NaiveDate>,
    pub plan_end_date: Option<NaiveDate>,
}

impl DeadlineOverride {
    pub fn is_empty(&self) -> bool {
        self.six_months_payment_end.is_none()
            && self.application_deadline_start.is_none()
            && self.application_deadline_end.is_none()
            && self.plan_end_date.is_none()
    }

    pub fn apply(&self, computed: DerivedDeadlines) -> DerivedDeadlines {
        DerivedDeadlines {
            six_months_payment_end: self
                .six_months_payment_end
                .unwrap_or(computed.six_months_payment_end),
            application_deadline_start: self
                .application_deadline_start
                .unwrap_or(computed.application_deadline_start),
            application_deadline_end: self
                .application_deadline_end
                .unwrap_or(computed.application_deadline_end),
            plan_end_date: self.plan_end_date.unwrap_or(computed.plan_end_date),
            ..computed
        }
    }
}

/// The deadlines everything downstream should use: the override when the
/// record is flagged as overridden, otherwise the computed set unchanged.
pub fn effective_deadlines(
    computed: DerivedDeadlines,
    is_deadline_overridden: bool,
    overrides: &DeadlineOverride,
) -> DerivedDeadlines {
    if is_deadline_overridden {
        overrides.apply(computed)
    } else {
        computed
    }
}
