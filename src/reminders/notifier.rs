// src/reminders/notifier.rs

use reqwest::blocking::Client;
use serde::Serialize;

use super::scheduler::ReminderThreshold;
use super::store::ApplicationSnapshot;
use crate::dates::format_localized;
use crate::errors::ReminderError;

const BREVO_ENDPOINT: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderMessage {
    pub application_id: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl ReminderMessage {
    pub fn for_threshold(snap: &ApplicationSnapshot, threshold: ReminderThreshold) -> Self {
        let days = threshold.days();
        let unit = if days == 1 { "day" } else { "days" };
        Self {
            application_id: snap.application_id.clone(),
            recipient: snap.recipient.clone(),
            subject: format!("Application deadline in {days} {unit}"),
            body: format!(
                "{name}: the subsidy application deadline is {deadline} ({days} {unit} remaining). \
                 Please submit the application before the deadline.",
                name = snap.applicant_name,
                deadline = format_localized(snap.application_deadline_end),
            ),
        }
    }

    /// Operator-triggered message. Falls back to a deadline summary when no
    /// text is supplied.
    pub fn manual(snap: &ApplicationSnapshot, message: Option<&str>) -> Self {
        let body = match message.map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!(
                "{name}: this is a reminder that the subsidy application deadline is {deadline}.",
                name = snap.applicant_name,
                deadline = format_localized(snap.application_deadline_end),
            ),
        };
        Self {
            application_id: snap.application_id.clone(),
            recipient: snap.recipient.clone(),
            subject: "Reminder about your subsidy application".to_string(),
            body,
        }
    }
}

/// Delivers a message. Never decides whether or when to send.
pub trait Notifier: Send + Sync {
    fn deliver(&self, msg: &ReminderMessage) -> Result<(), ReminderError>;
}

/// Development/demo channel: writes the reminder to the log only.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, msg: &ReminderMessage) -> Result<(), ReminderError> {
        tracing::info!(
            application_id = %msg.application_id,
            recipient = %msg.recipient,
            subject = %msg.subject,
            body = %msg.body,
            "reminder (log-only delivery)"
        );
        Ok(())
    }
}

pub struct BrevoNotifier {
    api_key: String,
    sender_email: String,
    sender_name: String,
    client: Client,
}

#[derive(Serialize)]
struct BrevoSender<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct BrevoRecipient<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoPayload<'a> {
    sender: BrevoSender<'a>,
    to: Vec<BrevoRecipient<'a>>,
    subject: &'a str,
    text_content: &'a str,
}

impl BrevoNotifier {
    pub fn new(api_key: String, sender_email: String, sender_name: String) -> Self {
        Self {
            api_key,
            sender_email,
            sender_name,
            client: Client::new(),
        }
    }
}

impl Notifier for BrevoNotifier {
    fn deliver(&self, msg: &ReminderMessage) -> Result<(), ReminderError> {
        let payload = BrevoPayload {
            sender: BrevoSender {
                name: &self.sender_name,
                email: &self.sender_email,
            },
            to: vec![BrevoRecipient {
                email: &msg.recipient,
            }],
            subject: &msg.subject,
            text_content: &msg.body,
        };

        let resp = self
            .client
            .post(BREVO_ENDPOINT)
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .map_err(|e| ReminderError::Delivery(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().unwrap_or_else(|_| "(no body)".to_string());
            return Err(ReminderError::Delivery(format!(
                "Brevo API error: {status} - {text}"
            )));
        }

        tracing::info!(application_id = %msg.application_id, "reminder email sent");
        Ok(())
    }
}
