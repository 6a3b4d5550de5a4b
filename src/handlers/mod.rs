pub mod session;
pub mod sm_policy_notify;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::db::AppState;
use crate::services::notification_relay::NotificationError;
use crate::types::error::SessionError;
use crate::types::pcf::ProblemDetails;

pub const SESSION_API_PREFIX: &str = "/session-proxy/v1/sessions";

/// Gateway-facing session control API.
pub fn session_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(session::get_health_status))
        .route(
            &format!("{}/create", SESSION_API_PREFIX),
            post(session::create_session),
        )
        .route(
            &format!("{}/update", SESSION_API_PREFIX),
            post(session::update_session),
        )
        .route(
            &format!("{}/terminate", SESSION_API_PREFIX),
            post(session::terminate_session),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// PCF callbacks, mounted under the path of the notification API root.
pub fn notify_router(state: AppState, notify_path: &str) -> Router {
    let base = notify_path.trim_end_matches('/');
    Router::new()
        .route(
            &format!("{}/:session_id/update", base),
            post(sm_policy_notify::sm_policy_update_notify),
        )
        .route(
            &format!("{}/:session_id/terminate", base),
            post(sm_policy_notify::sm_policy_terminate_notify),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    UpstreamError(String),
    Timeout(String),
    InternalError(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Validation(_) => AppError::ValidationError(e.to_string()),
            SessionError::Timeout(_) => AppError::Timeout(e.to_string()),
            SessionError::Upstream { .. }
            | SessionError::Transport(_)
            | SessionError::MissingLocation => AppError::UpstreamError(e.to_string()),
        }
    }
}

impl From<NotificationError> for AppError {
    fn from(e: NotificationError) -> Self {
        match e {
            NotificationError::InvalidSessionId(_) => AppError::ValidationError(e.to_string()),
            NotificationError::Relay(_) => AppError::InternalError(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title, detail) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg),
            AppError::UpstreamError(msg) => (StatusCode::BAD_GATEWAY, "Bad Gateway", msg),
            AppError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "Gateway Timeout", msg),
            AppError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", msg)
            }
        };

        let problem = ProblemDetails {
            title: Some(title.to_string()),
            status: Some(status.as_u16()),
            detail: Some(detail),
            ..Default::default()
        };

        (status, Json(problem)).into_response()
    }
}
