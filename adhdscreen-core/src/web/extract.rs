// src/web/extract.rs

use std::collections::HashMap;

use axum::extract::{FromRef, FromRequest, FromRequestParts, Request};
use axum::http::header::{ACCEPT, CONTENT_TYPE, COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde_json::{json, Value};

use adhdscreen_common::models::Principal;
use crate::auth::SESSION_COOKIE;
use crate::scoring::RawPayload;
use crate::web::AppState;

/// Reads the session token out of the `Cookie` header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

pub fn wants_json(headers: &HeaderMap) -> bool {
    let has_json = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"))
    };
    has_json(ACCEPT) || has_json(CONTENT_TYPE)
}

/// A request made by a logged-in user.
#[derive(Debug, Clone)]
pub struct AuthSession(pub Principal);

impl<S> FromRequestParts<S> for AuthSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let principal = session_token(&parts.headers)
            .and_then(|token| app.accounts.current_principal(&token));

        match principal {
            Some(p) => Ok(AuthSession(p)),
            None if wants_json(&parts.headers) => Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Please log in to access this page." })),
            )
                .into_response()),
            None => Err(Redirect::to("/login?error=Please%20log%20in%20to%20access%20this%20page.")
                .into_response()),
        }
    }
}

/// A questionnaire submission, either form-encoded or a JSON object.
#[derive(Debug, Clone)]
pub struct Submission {
    pub payload: RawPayload,
    pub is_json: bool,
}

impl<S> FromRequest<S> for Submission
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(payload) = Json::<RawPayload>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self { payload, is_json })
        } else {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            let payload = fields
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            Ok(Self { payload, is_json })
        }
    }
}
