use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};
use serde_json::json;

pub type ResultResp = Result<Response, ServerError>;

/// Convert a ServerError into a JSON error response
pub fn error_to_response(err: ServerError) -> Response {
    let (status, kind) = match &err {
        ServerError::NotFound => (404, "not_found"),
        ServerError::BadRequest(_) => (400, "bad_request"),
        ServerError::InvalidInput(_) => (400, "invalid_input"),
        ServerError::DbError(_) => (500, "store"),
        ServerError::Delivery(_) => (502, "delivery"),
        ServerError::InternalError => (500, "internal"),
    };

    if status >= 500 {
        tracing::error!(error = %err, status, "request failed");
    } else {
        tracing::debug!(error = %err, status, "request rejected");
    }

    let body = json!({
        "success": false,
        "error": kind,
        "message": err.to_string(),
    });

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
