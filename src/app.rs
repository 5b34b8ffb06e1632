// src/app.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::NotifierMode;
use crate::db::connection::Database;
use crate::db::store::SqliteStore;
use crate::errors::ReminderError;
use crate::reminders::scheduler::ManualDispatch;
use crate::reminders::{
    BrevoNotifier, LogNotifier, Notifier, ReminderScheduler, RunReport, ThresholdMode,
};

/// Shared by every worker thread.
pub struct AppState {
    pub db: Database,
    pub notifier: Arc<dyn Notifier>,
    pub threshold_mode: ThresholdMode,
    /// Cancel flags of the passes currently running, one per pass.
    active_runs: Mutex<Vec<Arc<AtomicBool>>>,
}

/// Registers a pass's cancel flag for as long as the pass runs.
struct ActiveRun<'a> {
    state: &'a AppState,
    flag: Arc<AtomicBool>,
}

impl<'a> ActiveRun<'a> {
    fn register(state: &'a AppState) -> Self {
        let flag = Arc::new(AtomicBool::new(false));
        state.lock_runs().push(Arc::clone(&flag));
        Self { state, flag }
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.state
            .lock_runs()
            .retain(|f| !Arc::ptr_eq(f, &self.flag));
    }
}

impl AppState {
    pub fn new(db: Database, notifier: Arc<dyn Notifier>, threshold_mode: ThresholdMode) -> Self {
        Self {
            db,
            notifier,
            threshold_mode,
            active_runs: Mutex::new(Vec::new()),
        }
    }

    fn lock_runs(&self) -> MutexGuard<'_, Vec<Arc<AtomicBool>>> {
        self.active_runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// One evaluation pass over all active applications. Each pass owns its
    /// cancel flag, so a cancel only reaches passes already running.
    pub fn run_reminders(&self, now: DateTime<Utc>) -> RunReport {
        let run = ActiveRun::register(self);
        let store = SqliteStore::new(self.db.clone());
        let report = ReminderScheduler::new(&store, self.notifier.as_ref())
            .with_mode(self.threshold_mode)
            .with_cancel(&run.flag)
            .run(now);
        report
    }

    /// Stops every pass in progress before its next application. Returns how
    /// many passes were signalled.
    pub fn request_cancel(&self) -> usize {
        let runs = self.lock_runs();
        for flag in runs.iter() {
            flag.store(true, Ordering::SeqCst);
        }
        tracing::info!(runs = runs.len(), "reminder run cancellation requested");
        runs.len()
    }

    pub fn send_manual(
        &self,
        application_id: &str,
        message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ManualDispatch, ReminderError> {
        let store = SqliteStore::new(self.db.clone());
        ReminderScheduler::new(&store, self.notifier.as_ref()).send_manual(
            application_id,
            message,
            now,
        )
    }
}

pub fn build_notifier(mode: &NotifierMode) -> Arc<dyn Notifier> {
    match mode {
        NotifierMode::LogOnly => Arc::new(LogNotifier),
        NotifierMode::Email {
            api_key,
            sender_email,
            sender_name,
        } => Arc::new(BrevoNotifier::new(
            api_key.clone(),
            sender_email.clone(),
            sender_name.clone(),
        )),
    }
}

/// Built-in trigger: runs a reminder pass every `interval` on its own thread.
pub fn spawn_reminder_loop(state: Arc<AppState>, interval: Duration) {
    tracing::info!(interval_secs = interval.as_secs(), "starting reminder loop");
    thread::spawn(move || loop {
        let report = state.run_reminders(Utc::now());
        if !report.success() {
            tracing::warn!(failed = report.failures.len(), "reminder run had failures");
        }
        thread::sleep(interval);
    });
}
