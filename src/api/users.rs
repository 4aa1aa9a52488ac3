use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::auth::UserProfile;
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
    response::IntoResponse,
};
use uuid::Uuid;

/// Public profile of any user, so a counterpart can be looked up before a thread exists.
///
/// # Errors
/// Returns `AppError::NotFound` if no user has this id.
pub async fn get_profile(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(user_id) = path.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let user = state.account_service.profile(user_id).await?;
    Ok(Json(UserProfile::from(user)))
}
