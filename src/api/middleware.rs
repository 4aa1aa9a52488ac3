use crate::api::AppState;
use crate::domain::auth::Jwt;
use crate::error::AppError;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

/// The authenticated caller, resolved from a `Bearer` access token.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get(header::AUTHORIZATION).ok_or(AppError::AuthError)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::AuthError)?;
        let token = auth_str.strip_prefix("Bearer ").ok_or(AppError::AuthError)?;

        let user_id = state.auth_service.verify_token(&Jwt::new(token.trim().to_string()))?;
        tracing::Span::current().record("user_id", tracing::field::display(user_id));

        Ok(Self { user_id })
    }
}
