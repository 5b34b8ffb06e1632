use crate::app::AppState;
use crate::deadlines::{compute, compute_career_plan_deadline, validate_anchor, OverrideRequest};
use crate::domain::applications::{self, parse_plan, CreateApplicationRequest};
use crate::errors::ServerError;
use crate::reminders::RunReport;
use crate::responses::{json_response, json_status, ResultResp};
use astra::Request;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManualReminderRequest {
    application_id: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnchorRequest {
    anchor_date: String,
}

#[derive(Deserialize)]
struct StatusRequest {
    status: String,
}

#[derive(Serialize)]
struct CheckResponse<'a> {
    success: bool,
    #[serde(flatten)]
    report: &'a RunReport,
}

pub fn handle(req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let query = parse_query(&req);
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let now = Utc::now();

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["health"]) => json_response(&json!({ "status": "ok" })),

        ("POST", ["reminders", "check"]) => {
            let report = state.run_reminders(now);
            json_response(&CheckResponse {
                success: report.success(),
                report: &report,
            })
        }
        ("POST", ["reminders", "cancel"]) => {
            let cancelled = state.request_cancel();
            json_response(&json!({ "success": true, "cancelled": cancelled }))
        }
        ("PUT", ["reminders", "manual"]) => {
            let body: ManualReminderRequest = read_json(req)?;
            let Some(id) = body
                .application_id
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
            else {
                return Err(ServerError::BadRequest("applicationId is required".into()));
            };

            let sent = state.send_manual(id, body.message.as_deref(), now)?;
            json_response(&json!({
                "success": true,
                "applicationId": sent.application_id,
                "sentAt": sent.sent_at,
            }))
        }

        ("GET", ["deadlines", "preview"]) => {
            let anchor = query
                .get("anchor")
                .ok_or_else(|| ServerError::BadRequest("missing anchor".into()))?;
            let plan_name = query
                .get("plan")
                .ok_or_else(|| ServerError::BadRequest("missing plan".into()))?;
            let plan = parse_plan(plan_name, query.get("planEndDate").map(String::as_str))?;

            let report = compute(anchor, now, plan)?;
            let career_plan = compute_career_plan_deadline(anchor, now)?;
            json_response(&json!({
                "success": true,
                "deadlines": report,
                "careerPlan": career_plan,
                "anchorValidation": validate_anchor(anchor, now),
            }))
        }

        ("GET", ["applications"]) => {
            let list = applications::list_applications(&state.db, now)?;
            json_response(&json!({ "success": true, "applications": list }))
        }
        ("POST", ["applications"]) => {
            let body: CreateApplicationRequest = read_json(req)?;
            let view = applications::create_application(&state.db, &body, now)?;
            json_status(201, &json!({ "success": true, "application": view }))
        }
        ("GET", ["applications", id]) => {
            let view = applications::get_application(&state.db, id, now)?;
            json_response(&json!({ "success": true, "application": view }))
        }
        ("DELETE", ["applications", id]) => {
            applications::delete_application(&state.db, id)?;
            json_response(&json!({ "success": true }))
        }
        ("PUT", ["applications", id, "anchor"]) => {
            let body: AnchorRequest = read_json(req)?;
            let view = applications::reedit_anchor(&state.db, id, &body.anchor_date, now)?;
            json_response(&json!({ "success": true, "application": view }))
        }
        ("PUT", ["applications", id, "override"]) => {
            let body: OverrideRequest = read_json(req)?;
            let view = applications::update_override(&state.db, id, &body, now)?;
            json_response(&json!({ "success": true, "application": view }))
        }
        ("PUT", ["applications", id, "status"]) => {
            let body: StatusRequest = read_json(req)?;
            let view = applications::update_status(&state.db, id, &body.status, now)?;
            json_response(&json!({ "success": true, "application": view }))
        }

        _ => Err(ServerError::NotFound),
    }
}

fn read_json<T: DeserializeOwned>(req: Request) -> Result<T, ServerError> {
    let mut body = req.into_body();
    serde_json::from_reader(body.reader())
        .map_err(|e| ServerError::BadRequest(format!("invalid JSON body: {e}")))
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    let mut map = HashMap::new();

    if let Some(q) = req.uri().query() {
        for (k, v) in url::form_urlencoded::parse(q.as_bytes()) {
            map.insert(k.into_owned(), v.into_owned());
        }
    }

    map
}
