// src/web/handlers.rs

use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use adhdscreen_common::models::{Gender, RiskLevel, ScreeningResult, User};
use crate::Error;
use crate::auth::SESSION_COOKIE;
use crate::services::Registration;
use crate::web::error::{log_failure, public_message, ApiError};
use crate::web::extract::{session_token, AuthSession, Submission};
use crate::web::AppState;

/// What the result and dashboard pages show for one result.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ResultView {
    pub id: i64,
    pub score: i32,
    pub percentage: f64,
    pub risk_level: RiskLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<ScreeningResult> for ResultView {
    fn from(r: ScreeningResult) -> Self {
        Self {
            id: r.id,
            score: r.score,
            percentage: r.percentage,
            risk_level: r.risk_level,
            message: r.message,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardView {
    pub user_name: String,
    pub recent_results: Vec<ResultView>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: String,
    age: Option<String>,
    gender: Option<String>,
    phone: Option<String>,
    occupation: Option<String>,
}

impl RegisterForm {
    fn into_registration(self) -> Result<Registration, Error> {
        let age = match self.age.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| Error::InvalidInput("Please enter a valid age.".into()))?,
            ),
        };
        let gender = match self.gender.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<Gender>()?),
        };
        Ok(Registration {
            name: format!("{} {}", self.first_name.trim(), self.last_name.trim()).trim().to_string(),
            email: self.email,
            password: self.password,
            confirm_password: self.confirm_password,
            age,
            gender,
            phone: self.phone,
            address: self.occupation,
        })
    }
}

/// Sends the browser back to `page` with a one-shot message in the query string.
fn redirect_with(page: &str, key: &str, message: &str) -> Response {
    Redirect::to(&format!("{}?{}={}", page, key, urlencoding::encode(message))).into_response()
}

fn redirect_with_error(state: &AppState, page: &str, err: &Error) -> Response {
    log_failure(err);
    let (_, message) = public_message(err, state.expose_internal_errors);
    redirect_with(page, "error", &message)
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    let outcome = match form.into_registration() {
        Ok(registration) => state.accounts.register(registration).await,
        Err(e) => Err(e),
    };
    match outcome {
        Ok(_) => redirect_with("/login", "notice", "Registration successful! Please log in."),
        Err(e) => redirect_with_error(&state, "/login", &e),
    }
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match state.accounts.login(&form.email, &form.password).await {
        Ok((token, principal)) => {
            info!("User {} logged in", principal.id);
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
                SESSION_COOKIE, token, state.session_ttl_secs
            );
            ([(SET_COOKIE, cookie)], Redirect::to("/dashboard")).into_response()
        }
        Err(e) => redirect_with_error(&state, "/login", &e),
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.accounts.logout(&token).await;
    }
    let cleared = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    (
        [(SET_COOKIE, cleared)],
        redirect_with("/login", "notice", "You have been logged out."),
    )
        .into_response()
}

pub async fn checklist_form(
    State(state): State<AppState>,
    AuthSession(_principal): AuthSession,
) -> Result<Json<serde_json::Value>, ApiError> {
    let schema = state
        .screening
        .features()
        .map_err(|e| ApiError::new(e.into(), state.expose_internal_errors))?;
    Ok(Json(json!({ "features": schema.names() })))
}

/// On success redirects to the stored result. Form posts go back to the
/// checklist with the error; JSON posts get the error as JSON.
pub async fn checklist_submit(
    State(state): State<AppState>,
    AuthSession(principal): AuthSession,
    submission: Submission,
) -> Response {
    match state.screening.submit(&principal, submission.payload).await {
        Ok(outcome) => Redirect::to(&format!("/results/{}", outcome.result_id)).into_response(),
        Err(e) if submission.is_json => ApiError::new(e, state.expose_internal_errors).into_response(),
        Err(e) => redirect_with_error(&state, "/checklist", &e),
    }
}

pub async fn result_view(
    State(state): State<AppState>,
    AuthSession(principal): AuthSession,
    Path(result_id): Path<i64>,
) -> Result<Json<ResultView>, ApiError> {
    let expose = state.expose_internal_errors;
    match state.screening.result(&principal, result_id).await {
        Ok(Some(result)) => Ok(Json(result.into())),
        Ok(None) => Err(ApiError::new(Error::NotFound(format!("result {}", result_id)), expose)),
        Err(e) => Err(ApiError::new(e, expose)),
    }
}

pub async fn dashboard(
    State(state): State<AppState>,
    AuthSession(principal): AuthSession,
) -> Result<Json<DashboardView>, ApiError> {
    let recent = state
        .screening
        .dashboard(&principal)
        .await
        .map_err(|e| ApiError::new(e, state.expose_internal_errors))?;
    Ok(Json(DashboardView {
        user_name: principal.name,
        recent_results: recent.into_iter().map(ResultView::from).collect(),
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    AuthSession(principal): AuthSession,
) -> Result<Json<User>, ApiError> {
    state
        .accounts
        .profile(&principal)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, state.expose_internal_errors))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found." })))
}
