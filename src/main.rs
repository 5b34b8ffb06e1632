use crate::app::{build_notifier, spawn_reminder_loop, AppState};
use crate::config::Config;
use crate::db::connection::{init_db, Database};
use crate::responses::error_to_response;
use crate::router::handle;
use astra::Server;
use chrono::Utc;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod dates;
mod db;
mod deadlines;
mod domain;
mod errors;
mod reminders;
mod responses;
mod router;

#[cfg(test)]
mod tests;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let db = Database::new(config.database_path.clone());
    if let Err(e) = init_db(&db, &config.schema_path) {
        tracing::error!(error = %e, "database initialization failed");
        std::process::exit(1);
    }

    let notifier = build_notifier(&config.notifier);
    let state = Arc::new(AppState::new(db, notifier, config.threshold_mode));

    // `grant_deadlines check`: one pass for cron-style triggers, then exit.
    if std::env::args().nth(1).as_deref() == Some("check") {
        let report = state.run_reminders(Utc::now());
        match serde_json::to_string_pretty(&report) {
            Ok(out) => println!("{out}"),
            Err(e) => tracing::error!(error = %e, "could not render report"),
        }
        std::process::exit(if report.success() { 0 } else { 1 });
    }

    if let Some(interval) = config.reminder_interval {
        spawn_reminder_loop(Arc::clone(&state), interval);
    }

    tracing::info!(addr = %config.bind_addr, mode = ?config.threshold_mode, "starting server");
    let server = Server::bind(&config.bind_addr).max_workers(config.max_workers);

    let result = server.serve(move |req, _info| match handle(req, &state) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    });

    if let Err(e) = result {
        tracing::error!(error = %e, "server ended with error");
    }

    tracing::info!("server shut down cleanly");
}
