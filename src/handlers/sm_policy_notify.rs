use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::db::AppState;
use crate::handlers::AppError;
use crate::types::pcf::{SmPolicyNotification, TerminationNotification};
use crate::types::session::AbortSessionCode;

pub async fn sm_policy_update_notify(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(notification): Json<SmPolicyNotification>,
) -> Result<Response, AppError> {
    tracing::info!(
        "SM policy update notification for {}",
        notification.resource_uri.as_deref().unwrap_or("unknown policy")
    );

    let report = state
        .notification_relay
        .policy_update(&session_id, &notification)
        .await
        .map_err(|e| {
            tracing::error!("Failed to handle SM policy update notification: {}", e);
            AppError::from(e)
        })?;

    Ok(match report {
        Some(report) => (StatusCode::OK, Json(report)).into_response(),
        None => StatusCode::OK.into_response(),
    })
}

pub async fn sm_policy_terminate_notify(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(notification): Json<TerminationNotification>,
) -> Result<StatusCode, AppError> {
    let code = state
        .notification_relay
        .policy_terminate(&session_id, &notification)
        .await
        .map_err(|e| {
            tracing::error!("Failed to handle SM policy terminate notification: {}", e);
            AppError::from(e)
        })?;

    match code {
        AbortSessionCode::SessionNotFound | AbortSessionCode::UserNotFound => {
            Ok(StatusCode::NOT_FOUND)
        }
        AbortSessionCode::GatewayNotFound => Err(AppError::InternalError(format!(
            "No gateway serves session {}",
            session_id
        ))),
        AbortSessionCode::SessionRemoved | AbortSessionCode::Other => Ok(StatusCode::NO_CONTENT),
    }
}
