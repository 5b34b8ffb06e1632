// src/db/store.rs
use chrono::{DateTime, Utc};

use super::applications;
use super::connection::Database;
use super::dispatches;
use crate::errors::{ReminderError, ServerError};
use crate::reminders::{ApplicationSnapshot, ApplicationStore, ReminderHistory, ReminderThreshold};

/// SQLite-backed application store handed to the reminder scheduler.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn store_err(e: ServerError) -> ReminderError {
    ReminderError::Store(e.to_string())
}

impl ReminderHistory for SqliteStore {
    fn has_dispatched(
        &self,
        application_id: &str,
        threshold: ReminderThreshold,
    ) -> Result<bool, ReminderError> {
        self.db
            .with_conn(|conn| dispatches::has_dispatch(conn, application_id, threshold.days()))
            .map_err(store_err)
    }
}

impl ApplicationStore for SqliteStore {
    fn active_application_ids(&self) -> Result<Vec<String>, ReminderError> {
        self.db
            .with_conn(|conn| applications::list_active_ids(conn))
            .map_err(store_err)
    }

    fn load_snapshot(
        &self,
        application_id: &str,
    ) -> Result<Option<ApplicationSnapshot>, ReminderError> {
        let Some(rec) = self
            .db
            .with_conn(|conn| applications::get_application(conn, application_id))
            .map_err(store_err)?
        else {
            return Ok(None);
        };

        let effective = rec.effective().map_err(store_err)?;
        Ok(Some(ApplicationSnapshot {
            application_id: rec.id,
            applicant_name: rec.applicant_name,
            recipient: rec.recipient_email,
            application_deadline_end: effective.application_deadline_end,
            last_evaluated_days: rec.last_evaluated_days,
        }))
    }

    fn record_dispatch(
        &self,
        application_id: &str,
        threshold: ReminderThreshold,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, ReminderError> {
        self.db
            .with_conn(|conn| {
                dispatches::record_dispatch(
                    conn,
                    application_id,
                    threshold.days(),
                    sent_at.timestamp(),
                )
            })
            .map_err(store_err)
    }

    fn save_watermark(&self, application_id: &str, days_remaining: i64) -> Result<(), ReminderError> {
        self.db
            .with_conn(|conn| applications::save_watermark(conn, application_id, days_remaining))
            .map_err(store_err)
    }
}
