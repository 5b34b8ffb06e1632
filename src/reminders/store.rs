// src/reminders/store.rs

use chrono::{DateTime, NaiveDate, Utc};

use super::scheduler::ReminderThreshold;
use crate::errors::ReminderError;

/// What the scheduler needs to know about one application. Deadlines are
/// already the effective ones (override substituted) when a store hands
/// this out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSnapshot {
    pub application_id: String,
    pub applicant_name: String,
    pub recipient: String,
    pub application_deadline_end: NaiveDate,
    /// Days remaining seen at the last fully successful evaluation.
    pub last_evaluated_days: Option<i64>,
}

pub trait ReminderHistory {
    fn has_dispatched(
        &self,
        application_id: &str,
        threshold: ReminderThreshold,
    ) -> Result<bool, ReminderError>;
}

/// Read/write access to application records and dispatch history.
///
/// Every call may fail independently; the scheduler treats each failure as
/// scoped to the application it was made for.
pub trait ApplicationStore: ReminderHistory {
    /// Ids of applications still eligible for automatic reminders.
    fn active_application_ids(&self) -> Result<Vec<String>, ReminderError>;

    fn load_snapshot(&self, application_id: &str)
        -> Result<Option<ApplicationSnapshot>, ReminderError>;

    /// Create-if-absent. `Ok(true)` when this call created the record,
    /// `Ok(false)` when one already existed.
    fn record_dispatch(
        &self,
        application_id: &str,
        threshold: ReminderThreshold,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, ReminderError>;

    fn save_watermark(&self, application_id: &str, days_remaining: i64)
        -> Result<(), ReminderError>;
}
