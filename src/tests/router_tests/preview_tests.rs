use crate::tests::utils::{send, test_state, RecordingNotifier};
use http::Method;
use std::sync::Arc;

#[test]
fn preview_computes_without_storing() {
    let state = test_state(Arc::new(RecordingNotifier::default()));

    let (status, body) = send(
        &state,
        Method::GET,
        "/deadlines/preview?anchor=2024-01-15&plan=long_horizon",
        None,
    );
    assert_eq!(status, 200);

    let dl = &body["deadlines"];
    assert_eq!(dl["sixMonthsPaymentEnd"], "2024-08-15");
    assert_eq!(dl["applicationDeadlineStart"], "2024-08-16");
    assert_eq!(dl["applicationDeadlineEnd"], "2024-10-16");
    assert_eq!(dl["planEndDate"], "2029-01-15");
    assert_eq!(dl["urgency"], "overdue");
    assert_eq!(dl["isUrgent"], false);
    assert_eq!(body["careerPlan"]["deadlineDate"], "2024-01-14");
    // Long past the two-year registration window.
    assert_eq!(body["anchorValidation"]["isValid"], false);

    let (_, list) = send(&state, Method::GET, "/applications", None);
    assert_eq!(list["applications"].as_array().unwrap().len(), 0);
}

#[test]
fn preview_six_month_plan_with_explicit_end() {
    let state = test_state(Arc::new(RecordingNotifier::default()));

    let (status, body) = send(
        &state,
        Method::GET,
        "/deadlines/preview?anchor=2024-01-15&plan=career_up_six_month",
        None,
    );
    assert_eq!(status, 200);
    assert_eq!(body["deadlines"]["planEndDate"], "2024-07-15");

    let (_, body) = send(
        &state,
        Method::GET,
        "/deadlines/preview?anchor=2024-01-15&plan=career_up_six_month&planEndDate=2024-09-30",
        None,
    );
    assert_eq!(body["deadlines"]["planEndDate"], "2024-09-30");
}

#[test]
fn preview_rejects_bad_input() {
    let state = test_state(Arc::new(RecordingNotifier::default()));

    let (status, _) = send(&state, Method::GET, "/deadlines/preview?anchor=2024-01-15", None);
    assert_eq!(status, 400);

    let (status, body) = send(
        &state,
        Method::GET,
        "/deadlines/preview?anchor=not-a-date&plan=long_horizon",
        None,
    );
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid_input");
}

#[test]
fn preview_decodes_percent_encoded_timestamps() {
    let state = test_state(Arc::new(RecordingNotifier::default()));

    let (status, body) = send(
        &state,
        Method::GET,
        "/deadlines/preview?anchor=2024-01-15T09%3A30%3A00%2B09%3A00&plan=long_horizon",
        None,
    );
    assert_eq!(status, 200);
    assert_eq!(body["deadlines"]["anchorDate"], "2024-01-15");
    assert_eq!(body["deadlines"]["applicationDeadlineEnd"], "2024-10-16");
}
