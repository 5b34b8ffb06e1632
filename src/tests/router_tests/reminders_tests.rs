use crate::app::AppState;
use crate::dates::{add_days, format_iso};
use crate::errors::ReminderError;
use crate::reminders::notifier::{Notifier, ReminderMessage};
use crate::reminders::ThresholdMode;
use crate::tests::utils::{init_test_db, send, test_state, RecordingNotifier};
use chrono::Utc;
use http::Method;
use serde_json::json;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

/// Creates an application whose effective deadline is `days` days away,
/// using an override so the window does not depend on today's month length.
fn create_due_in(state: &AppState, days: i64) -> String {
    let today = Utc::now().date_naive();
    let (status, body) = send(
        state,
        Method::POST,
        "/applications",
        Some(json!({
            "applicantName": "Sato Manufacturing",
            "recipientEmail": "hr@sato.example",
            "anchorDate": format_iso(today),
            "planStrategy": "long_horizon",
        })),
    );
    assert_eq!(status, 201, "{body}");
    let id = body["application"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        state,
        Method::PUT,
        &format!("/applications/{id}/override"),
        Some(json!({
            "isDeadlineOverridden": true,
            "sixMonthsPaymentEnd": format_iso(add_days(today, -2).unwrap()),
            "applicationDeadlineStart": format_iso(add_days(today, -1).unwrap()),
            "applicationDeadlineEnd": format_iso(add_days(today, days).unwrap()),
        })),
    );
    assert_eq!(status, 200, "{body}");
    id
}

#[test]
fn check_with_no_applications() {
    let state = test_state(Arc::new(RecordingNotifier::default()));
    let (status, body) = send(&state, Method::POST, "/reminders/check", None);

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["evaluated"], 0);
    assert_eq!(body["sent"], json!([]));
}

#[test]
fn check_sends_each_threshold_once() {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = test_state(notifier.clone());
    let due = create_due_in(&state, 7);
    let _quiet = create_due_in(&state, 5);

    let (status, body) = send(&state, Method::POST, "/reminders/check", None);
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["evaluated"], 2);
    assert_eq!(body["sent"].as_array().unwrap().len(), 1);
    assert_eq!(body["sent"][0]["applicationId"], due.as_str());
    assert_eq!(body["sent"][0]["threshold"], 7);
    assert_eq!(notifier.count(), 1);

    let (_, again) = send(&state, Method::POST, "/reminders/check", None);
    assert_eq!(again["sent"], json!([]));
    assert_eq!(notifier.count(), 1);

    let (_, app) = send(&state, Method::GET, &format!("/applications/{due}"), None);
    let sent = app["application"]["remindersSent"].as_array().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["thresholdDays"], 7);
    assert!(sent[0]["sentAt"].as_i64().unwrap() > 0);
    assert_eq!(app["application"]["deadlineStatus"]["urgency"], "critical");
}

#[test]
fn failed_delivery_is_reported_and_not_recorded() {
    let notifier = Arc::new(RecordingNotifier {
        failing: true,
        ..Default::default()
    });
    let state = test_state(notifier);
    let id = create_due_in(&state, 3);

    let (status, body) = send(&state, Method::POST, "/reminders/check", None);
    assert_eq!(status, 200);
    assert_eq!(body["success"], false);
    assert_eq!(body["failures"][0]["kind"], "delivery");
    assert_eq!(body["failures"][0]["applicationId"], id.as_str());
    assert_eq!(body["failures"][0]["threshold"], 3);

    let (_, app) = send(&state, Method::GET, &format!("/applications/{id}"), None);
    assert_eq!(app["application"]["remindersSent"], json!([]));
}

#[test]
fn inactive_applications_are_skipped() {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = test_state(notifier.clone());
    let id = create_due_in(&state, 1);
    send(
        &state,
        Method::PUT,
        &format!("/applications/{id}/status"),
        Some(json!({ "status": "withdrawn" })),
    );

    let (_, body) = send(&state, Method::POST, "/reminders/check", None);
    assert_eq!(body["evaluated"], 0);
    assert_eq!(notifier.count(), 0);
}

#[test]
fn manual_requires_application_id() {
    let state = test_state(Arc::new(RecordingNotifier::default()));

    let (status, body) = send(&state, Method::PUT, "/reminders/manual", Some(json!({})));
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &state,
        Method::PUT,
        "/reminders/manual",
        Some(json!({ "applicationId": "   " })),
    );
    assert_eq!(status, 400);

    let (status, _) = send(&state, Method::PUT, "/reminders/manual", None);
    assert_eq!(status, 400);
}

#[test]
fn manual_unknown_application_is_not_found() {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = test_state(notifier.clone());

    let (status, body) = send(
        &state,
        Method::PUT,
        "/reminders/manual",
        Some(json!({ "applicationId": "app_missing" })),
    );
    assert_eq!(status, 404);
    assert_eq!(body["error"], "not_found");
    assert_eq!(notifier.count(), 0);
}

#[test]
fn manual_sends_are_repeatable_and_unrecorded() {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = test_state(notifier.clone());
    let id = create_due_in(&state, 20);

    for _ in 0..2 {
        let (status, body) = send(
            &state,
            Method::PUT,
            "/reminders/manual",
            Some(json!({ "applicationId": id, "message": "Documents still missing." })),
        );
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
    }

    assert_eq!(notifier.count(), 2);
    assert_eq!(
        notifier.sent.lock().unwrap()[0].body,
        "Documents still missing."
    );

    let (_, app) = send(&state, Method::GET, &format!("/applications/{id}"), None);
    assert_eq!(app["application"]["remindersSent"], json!([]));
}

#[test]
fn manual_delivery_failure_maps_to_bad_gateway() {
    let notifier = Arc::new(RecordingNotifier {
        failing: true,
        ..Default::default()
    });
    let state = test_state(notifier);
    let id = create_due_in(&state, 20);

    let (status, body) = send(
        &state,
        Method::PUT,
        "/reminders/manual",
        Some(json!({ "applicationId": id })),
    );
    assert_eq!(status, 502);
    assert_eq!(body["error"], "delivery");
}

#[test]
fn cancel_before_check_does_not_block_the_next_run() {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = test_state(notifier.clone());
    create_due_in(&state, 1);

    let (status, body) = send(&state, Method::POST, "/reminders/cancel", None);
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["cancelled"], 0);

    let (_, report) = send(&state, Method::POST, "/reminders/check", None);
    assert_eq!(report["cancelled"], false);
    assert_eq!(report["sent"].as_array().unwrap().len(), 1);
    assert_eq!(notifier.count(), 1);
}

/// Announces each delivery, then waits for the test to let it finish.
struct GatedNotifier {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl Notifier for GatedNotifier {
    fn deliver(&self, _msg: &ReminderMessage) -> Result<(), ReminderError> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        Ok(())
    }
}

#[test]
fn cancel_only_reaches_passes_already_running() {
    let (entered_tx, entered) = channel();
    let (release, release_rx) = channel();
    let notifier = GatedNotifier {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };
    let state = Arc::new(AppState::new(
        init_test_db(),
        Arc::new(notifier),
        ThresholdMode::Exact,
    ));
    create_due_in(&state, 7);
    create_due_in(&state, 7);

    let first = {
        let state = Arc::clone(&state);
        thread::spawn(move || state.run_reminders(Utc::now()))
    };
    entered.recv().unwrap();
    assert_eq!(state.request_cancel(), 1);

    // A pass started after the cancel must not clear it for the first one.
    let second = {
        let state = Arc::clone(&state);
        thread::spawn(move || state.run_reminders(Utc::now()))
    };
    entered.recv().unwrap();
    for _ in 0..3 {
        release.send(()).unwrap();
    }

    let first = first.join().unwrap();
    let second = second.join().unwrap();

    assert!(first.cancelled);
    assert_eq!(first.evaluated, 1);
    assert!(!second.cancelled);
    assert_eq!(second.evaluated, 2);
    assert_eq!(state.request_cancel(), 0);
}
