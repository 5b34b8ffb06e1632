// src/config.rs
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::reminders::ThresholdMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("{0} must be set when NOTIFIER_MODE=email")]
    Missing(&'static str),
}

/// Where reminders go. Only the notifier cares; scheduling is identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierMode {
    /// Development/demo: reminders are written to the log.
    LogOnly,
    Email {
        api_key: String,
        sender_email: String,
        sender_name: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub schema_path: String,
    pub bind_addr: SocketAddr,
    pub max_workers: usize,
    pub notifier: NotifierMode,
    pub threshold_mode: ThresholdMode,
    /// Built-in trigger; `None` leaves scheduling to an external caller.
    pub reminder_interval: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "deadlines.sqlite3".to_string(),
            schema_path: "sql/schema.sql".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_workers: 8,
            notifier: NotifierMode::LogOnly,
            threshold_mode: ThresholdMode::Exact,
            reminder_interval: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = get("DATABASE_PATH") {
            config.database_path = path;
        }
        if let Some(path) = get("SCHEMA_PATH") {
            config.schema_path = path;
        }
        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = addr.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "BIND_ADDR",
                value: addr.clone(),
            })?;
        }
        if let Some(workers) = get("MAX_WORKERS") {
            match workers.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_workers = n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "MAX_WORKERS",
                        value: workers,
                    })
                }
            }
        }
        if let Some(mode) = get("THRESHOLD_MODE") {
            config.threshold_mode =
                ThresholdMode::parse(&mode).ok_or(ConfigError::Invalid {
                    var: "THRESHOLD_MODE",
                    value: mode.clone(),
                })?;
        }
        if let Some(secs) = get("REMINDER_INTERVAL_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(0) => config.reminder_interval = None,
                Ok(n) => config.reminder_interval = Some(Duration::from_secs(n)),
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        var: "REMINDER_INTERVAL_SECS",
                        value: secs,
                    })
                }
            }
        }

        let mode = get("NOTIFIER_MODE").unwrap_or_else(|| "log".to_string());
        config.notifier = match mode.trim().to_ascii_lowercase().as_str() {
            "log" | "log-only" | "dev" => NotifierMode::LogOnly,
            "email" => NotifierMode::Email {
                api_key: get("BREVO_API_KEY")
                    .filter(|k| !k.trim().is_empty())
                    .ok_or(ConfigError::Missing("BREVO_API_KEY"))?,
                sender_email: get("SENDER_EMAIL")
                    .unwrap_or_else(|| "noreply@example.com".to_string()),
                sender_name: get("SENDER_NAME").unwrap_or_else(|| "Grant Deadlines".to_string()),
            },
            _ => {
                return Err(ConfigError::Invalid {
                    var: "NOTIFIER_MODE",
                    value: mode,
                })
            }
        };

        Ok(config)
    }
}
