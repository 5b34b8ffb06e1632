// errors.rs
use thiserror::Error;

/// Input rejected by the deadline calculator or validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeadlineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Failures raised while evaluating or delivering reminders.
/// Each one is scoped to a single application; a batch run collects them
/// instead of stopping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderError {
    #[error("application not found: {0}")]
    NotFound(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("store error: {0}")]
    Store(String),
}

impl ReminderError {
    /// Stable kind tag used in JSON payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ReminderError::NotFound(_) => "not_found",
            ReminderError::Delivery(_) => "delivery",
            ReminderError::Store(_) => "store",
        }
    }
}

/// Errors originating from either the server logic
/// (routing, missing resources, etc.) or downstream layers (DB, mail).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Invalid Input: {0}")]
    InvalidInput(String),
    #[error("Database Error: {0}")]
    DbError(String),
    #[error("Delivery Error: {0}")]
    Delivery(String),
    #[error("Internal Server Error")]
    InternalError,
}

impl From<DeadlineError> for ServerError {
    fn from(err: DeadlineError) -> Self {
        match err {
            DeadlineError::InvalidInput(msg) => ServerError::InvalidInput(msg),
        }
    }
}

impl From<ReminderError> for ServerError {
    fn from(err: ReminderError) -> Self {
        match err {
            ReminderError::NotFound(_) => ServerError::NotFound,
            ReminderError::Delivery(msg) => ServerError::Delivery(msg),
            ReminderError::Store(msg) => ServerError::DbError(msg),
        }
    }
}
