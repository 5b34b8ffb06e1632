pub mod notifier;
pub mod scheduler;
pub mod store;

pub use notifier::{BrevoNotifier, LogNotifier, Notifier};
pub use scheduler::{ReminderScheduler, ReminderThreshold, RunReport, ThresholdMode};
pub use store::{ApplicationSnapshot, ApplicationStore, ReminderHistory};
