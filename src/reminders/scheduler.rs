// src/reminders/scheduler.rs

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::notifier::{Notifier, ReminderMessage};
use super::store::{ApplicationSnapshot, ApplicationStore, ReminderHistory};
use crate::dates::days_until;
use crate::errors::ReminderError;

/// Day counts before the application deadline at which a reminder fires once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReminderThreshold {
    SevenDays,
    ThreeDays,
    OneDay,
}

impl ReminderThreshold {
    /// Widest first.
    pub const ALL: [ReminderThreshold; 3] = [
        ReminderThreshold::SevenDays,
        ReminderThreshold::ThreeDays,
        ReminderThreshold::OneDay,
    ];

    pub fn days(self) -> i64 {
        match self {
            ReminderThreshold::SevenDays => 7,
            ReminderThreshold::ThreeDays => 3,
            ReminderThreshold::OneDay => 1,
        }
    }

    pub fn from_days(days: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.days() == days)
    }
}

impl Serialize for ReminderThreshold {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(self.days())
    }
}

/// How a day count is matched against thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThresholdMode {
    /// Fires only when the day count equals a threshold. A day without any
    /// run misses that threshold for good, so callers must run at least daily.
    #[default]
    Exact,
    /// Fires the tightest threshold crossed since the last successful
    /// evaluation (`last > t >= days >= 0`). Without a watermark it behaves
    /// like `Exact`.
    Watermark,
}

impl ThresholdMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Some(ThresholdMode::Exact),
            "watermark" => Some(ThresholdMode::Watermark),
            _ => None,
        }
    }

    fn due(self, days: i64, last: Option<i64>) -> Option<ReminderThreshold> {
        match (self, last) {
            (ThresholdMode::Exact, _) | (ThresholdMode::Watermark, None) => {
                ReminderThreshold::from_days(days)
            }
            (ThresholdMode::Watermark, Some(last)) => {
                if days < 0 {
                    return None;
                }
                // ALL is widest first, so the last match is the tightest.
                ReminderThreshold::ALL
                    .into_iter()
                    .filter(|t| last > t.days() && t.days() >= days)
                    .last()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderAction {
    pub application_id: String,
    pub threshold: ReminderThreshold,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderFailure {
    /// `None` when the failure happened before any application was read.
    pub application_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<ReminderThreshold>,
    pub kind: &'static str,
    pub message: String,
}

impl ReminderFailure {
    fn new(
        application_id: Option<&str>,
        threshold: Option<ReminderThreshold>,
        err: &ReminderError,
    ) -> Self {
        Self {
            application_id: application_id.map(str::to_string),
            threshold,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result of the pure decision step.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub actions: Vec<ReminderAction>,
    pub failures: Vec<ReminderFailure>,
}

/// Decides which (application, threshold) pairs need a new send at `now`.
///
/// Sends nothing and writes nothing. A history lookup failure is recorded
/// against its application and the loop moves on.
pub fn evaluate<H>(
    applications: &[ApplicationSnapshot],
    history: &H,
    now: DateTime<Utc>,
    mode: ThresholdMode,
) -> Evaluation
where
    H: ReminderHistory + ?Sized,
{
    let mut out = Evaluation::default();

    for app in applications {
        let days = days_until(app.application_deadline_end, now);
        let Some(threshold) = mode.due(days, app.last_evaluated_days) else {
            continue;
        };

        match history.has_dispatched(&app.application_id, threshold) {
            Ok(true) => {
                tracing::debug!(
                    application_id = %app.application_id,
                    threshold = threshold.days(),
                    "reminder already dispatched"
                );
            }
            Ok(false) => out.actions.push(ReminderAction {
                application_id: app.application_id.clone(),
                threshold,
                days_remaining: days,
            }),
            Err(err) => out.failures.push(ReminderFailure::new(
                Some(&app.application_id),
                Some(threshold),
                &err,
            )),
        }
    }

    out
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub evaluated: usize,
    pub sent: Vec<ReminderAction>,
    pub failures: Vec<ReminderFailure>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualDispatch {
    pub application_id: String,
    pub sent_at: DateTime<Utc>,
}

/// Drives one reminder pass: read, decide, deliver, record.
///
/// Holds no state between calls; everything persistent lives in the store.
pub struct ReminderScheduler<'a> {
    store: &'a dyn ApplicationStore,
    notifier: &'a dyn Notifier,
    mode: ThresholdMode,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> ReminderScheduler<'a> {
    pub fn new(store: &'a dyn ApplicationStore, notifier: &'a dyn Notifier) -> Self {
        Self {
            store,
            notifier,
            mode: ThresholdMode::default(),
            cancel: None,
        }
    }

    pub fn with_mode(mut self, mode: ThresholdMode) -> Self {
        self.mode = mode;
        self
    }

    /// Checked between applications. Records already written stay.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|f| f.load(Ordering::Relaxed))
    }

    /// Evaluates every active application against one timestamp. Never
    /// fails as a whole: problems land in `RunReport::failures`.
    pub fn run(&self, now: DateTime<Utc>) -> RunReport {
        let mut report = RunReport::default();

        let ids = match self.store.active_application_ids() {
            Ok(ids) => ids,
            Err(err) => {
                tracing::error!(error = %err, "could not list applications");
                report.failures.push(ReminderFailure::new(None, None, &err));
                return report;
            }
        };

        for id in ids {
            if self.is_cancelled() {
                tracing::info!(evaluated = report.evaluated, "reminder run cancelled");
                report.cancelled = true;
                break;
            }
            report.evaluated += 1;
            self.run_one(&id, now, &mut report);
        }

        tracing::info!(
            evaluated = report.evaluated,
            sent = report.sent.len(),
            failed = report.failures.len(),
            "reminder run finished"
        );
        report
    }

    fn run_one(&self, id: &str, now: DateTime<Utc>, report: &mut RunReport) {
        let snap = match self.store.load_snapshot(id) {
            Ok(Some(snap)) => snap,
            // Deleted between listing and loading.
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(application_id = %id, error = %err, "failed to load application");
                report.failures.push(ReminderFailure::new(Some(id), None, &err));
                return;
            }
        };

        let decision = evaluate(std::slice::from_ref(&snap), self.store, now, self.mode);
        let mut clean = decision.failures.is_empty();
        report.failures.extend(decision.failures);

        for action in decision.actions {
            match self.dispatch(&snap, &action, now) {
                Ok(()) => report.sent.push(action),
                Err(err) => {
                    clean = false;
                    tracing::warn!(
                        application_id = %id,
                        threshold = action.threshold.days(),
                        error = %err,
                        "reminder not dispatched"
                    );
                    report
                        .failures
                        .push(ReminderFailure::new(Some(id), Some(action.threshold), &err));
                }
            }
        }

        if self.mode == ThresholdMode::Watermark && clean {
            let days = days_until(snap.application_deadline_end, now);
            if let Err(err) = self.store.save_watermark(id, days) {
                tracing::warn!(application_id = %id, error = %err, "failed to save watermark");
                report.failures.push(ReminderFailure::new(Some(id), None, &err));
            }
        }
    }

    /// Delivery first, record second: a failed delivery leaves no record so
    /// the next run retries the same threshold.
    fn dispatch(
        &self,
        snap: &ApplicationSnapshot,
        action: &ReminderAction,
        now: DateTime<Utc>,
    ) -> Result<(), ReminderError> {
        let msg = ReminderMessage::for_threshold(snap, action.threshold);
        self.notifier.deliver(&msg)?;

        let created = self
            .store
            .record_dispatch(&action.application_id, action.threshold, now)?;
        if created {
            tracing::info!(
                application_id = %action.application_id,
                threshold = action.threshold.days(),
                days_remaining = action.days_remaining,
                "reminder dispatched"
            );
        } else {
            tracing::warn!(
                application_id = %action.application_id,
                threshold = action.threshold.days(),
                "dispatch already recorded by a concurrent run"
            );
        }
        Ok(())
    }

    /// Operator-triggered reminder. No threshold logic, no dedupe, no record.
    pub fn send_manual(
        &self,
        application_id: &str,
        message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ManualDispatch, ReminderError> {
        let snap = self
            .store
            .load_snapshot(application_id)?
            .ok_or_else(|| ReminderError::NotFound(application_id.to_string()))?;

        self.notifier.deliver(&ReminderMessage::manual(&snap, message))?;
        tracing::info!(application_id = %application_id, "manual reminder sent");

        Ok(ManualDispatch {
            application_id: application_id.to_string(),
            sent_at: now,
        })
    }
}
