use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::messaging::{Message, SendMessage, StatusMessage, ThreadSummary};
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// Sends a message from the caller to `receiverId`.
///
/// # Errors
/// Returns `AppError::BadRequest` if the body is malformed or the content is invalid.
/// Returns `AppError::NotFound` if the receiver does not exist.
pub async fn send_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    payload: std::result::Result<Json<SendMessage>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let message = state.message_service.send_message(auth_user.user_id, payload.receiver_id, payload.content).await?;

    Ok((StatusCode::CREATED, Json(Message::from(message))))
}

/// # Errors
/// Returns `AppError::Forbidden` if the caller is not one of the two users.
pub async fn list_between(
    auth_user: AuthUser,
    State(state): State<AppState>,
    path: std::result::Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path((user_a, user_b)) = path.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let history = state.message_service.list_between(auth_user.user_id, user_a, user_b).await?;
    Ok(Json(history.into_iter().map(Message::from).collect::<Vec<_>>()))
}

pub async fn list_threads(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let threads = state.message_service.list_threads(auth_user.user_id).await?;
    Ok(Json(threads.into_iter().map(ThreadSummary::from).collect::<Vec<_>>()))
}

pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(counterpart_id) = path.map_err(|e| AppError::BadRequest(e.body_text()))?;
    state.message_service.mark_read(auth_user.user_id, counterpart_id).await?;
    Ok(Json(StatusMessage { message: "Thread marked as read" }))
}
