use crate::config::AuthConfig;
use crate::domain::auth::{Claims, Jwt};
use crate::error::{AppError, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::rngs::OsRng;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Password hashing and access-token issuance/verification.
#[derive(Clone, Debug)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    #[must_use]
    pub const fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    #[tracing::instrument(err, skip(self, password))]
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            let argon2 = Argon2::default();
            argon2.hash_password(password.as_bytes(), &salt).map_err(|_| AppError::Internal).map(|h| h.to_string())
        })
        .await
        .map_err(|_| AppError::Internal)?
    }

    #[tracing::instrument(err, skip(self, password, password_hash))]
    pub async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        tokio::task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash).map_err(|_| AppError::Internal)?;
            Ok(Argon2::default().verify_password(password.as_bytes(), &parsed_hash).is_ok())
        })
        .await
        .map_err(|_| AppError::Internal)?
    }

    /// Issues an access token for `user_id`, returning it with its expiry (unix seconds).
    ///
    /// # Errors
    /// Returns `AppError::Internal` if the token cannot be signed.
    pub fn issue_token(&self, user_id: Uuid) -> Result<(Jwt, i64)> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let exp = now + self.config.access_token_ttl_secs;

        let claims = Claims::new(user_id, usize::try_from(exp).map_err(|_| AppError::Internal)?);
        let jwt = self.encode_jwt(&claims)?;

        Ok((jwt, i64::try_from(exp).map_err(|_| AppError::Internal)?))
    }

    /// Verifies a JWT access token and returns the user ID (subject).
    ///
    /// # Errors
    /// Returns `AppError::AuthError` if the token is malformed, forged or expired.
    pub fn verify_token(&self, jwt: &Jwt) -> Result<Uuid> {
        let token_data = decode::<Claims>(
            jwt.as_str(),
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::AuthError)?;

        Ok(token_data.claims.sub)
    }

    fn encode_jwt(&self, claims: &Claims) -> Result<Jwt> {
        let token = encode(&Header::default(), claims, &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()))
            .map_err(|_| AppError::Internal)?;

        Ok(Jwt::new(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_service(secret: &str) -> AuthService {
        AuthService::new(AuthConfig { jwt_secret: secret.to_string(), access_token_ttl_secs: 3600 })
    }

    #[test]
    fn test_jwt_roundtrip() {
        let service = setup_service("test_secret");
        let user_id = Uuid::new_v4();

        let (jwt, expires_at) = service.issue_token(user_id).unwrap();
        let decoded_id = service.verify_token(&jwt).unwrap();

        assert_eq!(user_id, decoded_id);
        assert!(expires_at > 0);
    }

    #[test]
    fn test_jwt_invalid_secret() {
        let (jwt, _) = setup_service("secret1").issue_token(Uuid::new_v4()).unwrap();

        let result = setup_service("secret2").verify_token(&jwt);
        assert!(matches!(result, Err(AppError::AuthError)));
    }

    #[test]
    fn test_jwt_expired() {
        let service = setup_service("test_secret");
        let claims = Claims::new(Uuid::new_v4(), 1_000);
        let jwt = service.encode_jwt(&claims).unwrap();

        assert!(matches!(service.verify_token(&jwt), Err(AppError::AuthError)));
    }

    #[test]
    fn test_jwt_garbage() {
        let service = setup_service("test_secret");
        assert!(matches!(service.verify_token(&Jwt::new("not.a.jwt".into())), Err(AppError::AuthError)));
    }

    #[tokio::test]
    async fn test_password_hashing() {
        let service = setup_service("test_secret");
        let password = "password12345";
        let hash = service.hash_password(password).await.unwrap();

        assert!(service.verify_password(password, &hash).await.unwrap());
        assert!(!service.verify_password("wrong_password", &hash).await.unwrap());
    }
}
