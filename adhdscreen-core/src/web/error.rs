// src/web/error.rs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use adhdscreen_common::error::ScoreError;
use crate::Error;

const GENERIC_FAILURE: &str = "An unexpected error occurred.";
const TRY_AGAIN: &str = "The service is temporarily unavailable. Please try again.";
const MODEL_DOWN: &str = "Screening is currently unavailable.";

/// What a user is allowed to see about `err`. Internal detail is appended only
/// when `expose_internal` is set (development).
pub fn public_message(err: &Error, expose_internal: bool) -> (StatusCode, String) {
    let (status, message) = match err {
        Error::Validation(v) => (StatusCode::UNPROCESSABLE_ENTITY, v.to_string()),
        Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        Error::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        Error::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
        Error::NotFound(_) => (StatusCode::NOT_FOUND, "Not found.".to_string()),
        Error::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, TRY_AGAIN.to_string()),
        Error::Score(ScoreError::ModelUnavailable(_)) => {
            (StatusCode::SERVICE_UNAVAILABLE, MODEL_DOWN.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string()),
    };

    let hides_detail = status.is_server_error();
    if expose_internal && hides_detail {
        (status, format!("{} ({})", message, err))
    } else {
        (status, message)
    }
}

/// Logs at a level matching how bad the failure is.
pub fn log_failure(err: &Error) {
    match err {
        Error::Validation(_) | Error::InvalidInput(_) | Error::Conflict(_) | Error::Auth(_)
        | Error::NotFound(_) => {}
        Error::StoreUnavailable(_) => warn!("Storage unavailable: {}", err),
        Error::Score(ScoreError::ModelUnavailable(_)) => error!("Model unavailable: {}", err),
        _ => error!("Request failed: {}", err),
    }
}

/// JSON error response for API-style callers.
pub struct ApiError {
    pub error: Error,
    pub expose_internal: bool,
}

impl ApiError {
    pub fn new(error: Error, expose_internal: bool) -> Self {
        Self { error, expose_internal }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log_failure(&self.error);
        let (status, message) = public_message(&self.error, self.expose_internal);
        let mut body = json!({ "error": message });
        if let Error::Validation(v) = &self.error {
            body["field"] = json!(v.field());
        }
        (status, Json(body)).into_response()
    }
}
