use axum::{extract::State, Json};

use crate::db::AppState;
use crate::handlers::AppError;
use crate::types::session::{
    CreateSessionRequest, CreateSessionResponse, HealthStatus, SessionTerminateRequest,
    SessionTerminateResponse, UpdateSessionRequest, UpdateSessionResponse,
};

pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    tracing::info!(
        "Create session request - Session ID: {}, Subscriber: {}",
        request.session_id,
        request.subscriber_id()
    );

    let response = state.controller.create_session(&request).await?;
    Ok(Json(response))
}

pub async fn update_session(
    State(state): State<AppState>,
    Json(request): Json<UpdateSessionRequest>,
) -> Json<UpdateSessionResponse> {
    tracing::debug!(
        "Update session request with {} usage reports",
        request.usage_monitors.len()
    );

    Json(state.controller.update_session(&request).await)
}

pub async fn terminate_session(
    State(state): State<AppState>,
    Json(request): Json<SessionTerminateRequest>,
) -> Result<Json<SessionTerminateResponse>, AppError> {
    tracing::info!(
        "Terminate session request - Session ID: {}, Subscriber: {}",
        request.session_id,
        request.subscriber_id()
    );

    let response = state.controller.terminate_session(&request).await?;
    Ok(Json(response))
}

pub async fn get_health_status(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.controller.health().get_health_status())
}
