use crate::api::AppState;
use crate::api::schemas::auth::{AuthSession, Login, Registration};
use crate::error::{AppError, Result};
use crate::services::account_service;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

/// Creates an account and returns a session for it.
///
/// # Errors
/// Returns `AppError::BadRequest` for malformed or invalid fields.
/// Returns `AppError::Conflict` if the email is taken.
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Registration>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let session = state
        .account_service
        .register(account_service::Registration {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            role: payload.role,
            avatar_url: payload.avatar_url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AuthSession::from(session))))
}

/// # Errors
/// Returns `AppError::AuthError` if the credentials do not match an account.
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Login>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let session = state.account_service.login(payload.email, payload.password).await?;
    Ok(Json(AuthSession::from(session)))
}
