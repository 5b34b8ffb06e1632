use crate::dates::{add_days, format_iso};
use crate::deadlines::{derive_deadlines, PlanStrategy};
use crate::tests::utils::{send, test_state, RecordingNotifier};
use chrono::Utc;
use http::Method;
use serde_json::json;
use std::sync::Arc;

fn create(state: &crate::app::AppState, anchor: &str) -> String {
    let (status, body) = send(
        state,
        Method::POST,
        "/applications",
        Some(json!({
            "applicantName": "Sato Manufacturing",
            "recipientEmail": "HR@Sato.example",
            "anchorDate": anchor,
            "planStrategy": "long_horizon",
        })),
    );
    assert_eq!(status, 201, "create failed: {body}");
    body["application"]["id"].as_str().unwrap().to_string()
}

#[test]
fn create_application_derives_deadlines() {
    let state = test_state(Arc::new(RecordingNotifier::default()));
    let today = Utc::now().date_naive();
    let id = create(&state, &format_iso(today));

    let (status, body) = send(&state, Method::GET, &format!("/applications/{id}"), None);
    assert_eq!(status, 200);

    let expected = derive_deadlines(today, PlanStrategy::LongHorizon).unwrap();
    let app = &body["application"];
    assert_eq!(app["recipientEmail"], "hr@sato.example");
    assert_eq!(app["applicationStatus"], "active");
    assert_eq!(app["planStrategy"], "long_horizon");
    assert_eq!(app["isDeadlineOverridden"], false);
    assert_eq!(
        app["deadlines"]["applicationDeadlineEnd"],
        format_iso(expected.application_deadline_end)
    );
    assert_eq!(
        app["deadlines"]["sixMonthsPaymentEnd"],
        format_iso(expected.six_months_payment_end)
    );
    assert_eq!(app["deadlineStatus"]["urgency"], "normal");
    assert_eq!(app["careerPlan"]["isOverdue"], true);
    assert_eq!(app["remindersSent"], json!([]));
}

#[test]
fn create_rejects_out_of_window_anchor() {
    let state = test_state(Arc::new(RecordingNotifier::default()));
    let far = add_days(Utc::now().date_naive(), 60).unwrap();

    let (status, body) = send(
        &state,
        Method::POST,
        "/applications",
        Some(json!({
            "applicantName": "Sato",
            "recipientEmail": "hr@sato.example",
            "anchorDate": format_iso(far),
            "planStrategy": "long_horizon",
        })),
    );
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"].as_str().unwrap().contains("too far ahead"));

    let (status, _) = send(
        &state,
        Method::POST,
        "/applications",
        Some(json!({
            "applicantName": "Sato",
            "recipientEmail": "hr@sato.example",
            "anchorDate": "not-a-date",
            "planStrategy": "long_horizon",
        })),
    );
    assert_eq!(status, 400);

    let (_, list) = send(&state, Method::GET, "/applications", None);
    assert_eq!(list["applications"], json!([]));
}

#[test]
fn create_requires_explicit_plan() {
    let state = test_state(Arc::new(RecordingNotifier::default()));
    let today = format_iso(Utc::now().date_naive());

    let (status, body) = send(
        &state,
        Method::POST,
        "/applications",
        Some(json!({
            "applicantName": "Sato",
            "recipientEmail": "hr@sato.example",
            "anchorDate": today,
        })),
    );
    assert_eq!(status, 400);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = send(
        &state,
        Method::POST,
        "/applications",
        Some(json!({
            "applicantName": "Sato",
            "recipientEmail": "hr@sato.example",
            "anchorDate": today,
            "planStrategy": "whatever",
        })),
    );
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid_input");
}

#[test]
fn override_replaces_effective_deadline_and_can_be_cleared() {
    let state = test_state(Arc::new(RecordingNotifier::default()));
    let today = Utc::now().date_naive();
    let id = create(&state, &format_iso(today));
    let computed = derive_deadlines(today, PlanStrategy::LongHorizon).unwrap();
    let later = add_days(computed.application_deadline_end, 30).unwrap();

    let (status, body) = send(
        &state,
        Method::PUT,
        &format!("/applications/{id}/override"),
        Some(json!({
            "isDeadlineOverridden": true,
            "applicationDeadlineEnd": format_iso(later),
        })),
    );
    assert_eq!(status, 200, "{body}");
    let app = &body["application"];
    assert_eq!(app["isDeadlineOverridden"], true);
    assert_eq!(app["deadlines"]["applicationDeadlineEnd"], format_iso(later));
    assert_eq!(
        app["computed"]["applicationDeadlineEnd"],
        format_iso(computed.application_deadline_end)
    );

    // End before start is refused and leaves the stored override alone.
    let (status, _) = send(
        &state,
        Method::PUT,
        &format!("/applications/{id}/override"),
        Some(json!({
            "isDeadlineOverridden": true,
            "applicationDeadlineEnd": format_iso(today),
        })),
    );
    assert_eq!(status, 400);

    let (status, body) = send(
        &state,
        Method::PUT,
        &format!("/applications/{id}/override"),
        Some(json!({ "isDeadlineOverridden": false })),
    );
    assert_eq!(status, 200);
    assert_eq!(
        body["application"]["deadlines"]["applicationDeadlineEnd"],
        format_iso(computed.application_deadline_end)
    );
}

#[test]
fn anchor_reedit_recomputes() {
    let state = test_state(Arc::new(RecordingNotifier::default()));
    let today = Utc::now().date_naive();
    let id = create(&state, &format_iso(today));
    let earlier = add_days(today, -40).unwrap();

    let (status, body) = send(
        &state,
        Method::PUT,
        &format!("/applications/{id}/anchor"),
        Some(json!({ "anchorDate": format_iso(earlier) })),
    );
    assert_eq!(status, 200);

    let expected = derive_deadlines(earlier, PlanStrategy::LongHorizon).unwrap();
    assert_eq!(
        body["application"]["deadlines"]["applicationDeadlineEnd"],
        format_iso(expected.application_deadline_end)
    );

    let (status, _) = send(
        &state,
        Method::PUT,
        "/applications/app_missing/anchor",
        Some(json!({ "anchorDate": format_iso(today) })),
    );
    assert_eq!(status, 404);
}

#[test]
fn status_and_delete() {
    let state = test_state(Arc::new(RecordingNotifier::default()));
    let id = create(&state, &format_iso(Utc::now().date_naive()));

    let (status, body) = send(
        &state,
        Method::PUT,
        &format!("/applications/{id}/status"),
        Some(json!({ "status": "completed" })),
    );
    assert_eq!(status, 200);
    assert_eq!(body["application"]["applicationStatus"], "completed");

    let (status, _) = send(
        &state,
        Method::PUT,
        &format!("/applications/{id}/status"),
        Some(json!({ "status": "lost" })),
    );
    assert_eq!(status, 400);

    let (status, _) = send(&state, Method::DELETE, &format!("/applications/{id}"), None);
    assert_eq!(status, 200);

    let (status, body) = send(&state, Method::GET, &format!("/applications/{id}"), None);
    assert_eq!(status, 404);
    assert_eq!(body["error"], "not_found");

    let (status, _) = send(&state, Method::DELETE, &format!("/applications/{id}"), None);
    assert_eq!(status, 404);
}

#[test]
fn unknown_route_is_not_found() {
    let state = test_state(Arc::new(RecordingNotifier::default()));
    let (status, body) = send(&state, Method::GET, "/nowhere", None);
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);

    let (status, body) = send(&state, Method::GET, "/health", None);
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}
