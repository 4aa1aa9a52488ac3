use crate::domain::auth_session::AuthSession;
use crate::domain::repository::UserDirectory;
use crate::domain::user::{NewUser, Role, User, normalize_email};
use crate::error::{AppError, Result};
use crate::services::auth_service::AuthService;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use uuid::Uuid;

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Clone, Debug)]
struct AccountMetrics {
    users_registered_total: Counter<u64>,
    login_total: Counter<u64>,
}

impl AccountMetrics {
    fn new() -> Self {
        let meter = global::meter("jobboard-server");
        Self {
            users_registered_total: meter
                .u64_counter("jobboard_users_registered_total")
                .with_description("Total number of successful user registrations")
                .build(),
            login_total: meter
                .u64_counter("jobboard_auth_login_total")
                .with_description("Login attempts by outcome")
                .build(),
        }
    }
}

#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AccountService {
    users: Arc<dyn UserDirectory>,
    auth_service: AuthService,
    metrics: AccountMetrics,
}

impl AccountService {
    #[must_use]
    pub fn new(users: Arc<dyn UserDirectory>, auth_service: AuthService) -> Self {
        Self { users, auth_service, metrics: AccountMetrics::new() }
    }

    /// Creates an applicant or company account and opens a session for it.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if a field is invalid.
    /// Returns `AppError::Conflict` if the email is already registered.
    #[tracing::instrument(
        skip(self, registration),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn register(&self, registration: Registration) -> Result<AuthSession> {
        let new_user = self.validate_registration(registration).await?;

        let user = self.users.create(new_user).await?;
        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        let session = self.create_session(user)?;

        tracing::info!("User registered successfully");
        self.metrics.users_registered_total.add(1, &[]);

        Ok(session)
    }

    #[tracing::instrument(
        skip(self, email, password),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn login(&self, email: String, password: String) -> Result<AuthSession> {
        let Some(user) = self.users.find_by_email(&normalize_email(&email)).await? else {
            tracing::warn!("Login failed: account not found");
            self.metrics.login_total.add(1, &[KeyValue::new("status", "failure")]);
            return Err(AppError::AuthError);
        };

        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        if !self.auth_service.verify_password(&password, &user.password_hash).await? {
            tracing::warn!("Login failed: invalid password");
            self.metrics.login_total.add(1, &[KeyValue::new("status", "failure")]);
            return Err(AppError::AuthError);
        }

        let session = self.create_session(user)?;

        tracing::info!("User logged in successfully");
        self.metrics.login_total.add(1, &[KeyValue::new("status", "success")]);

        Ok(session)
    }

    /// # Errors
    /// Returns `AppError::NotFound` if no user has this id.
    #[tracing::instrument(err(level = "debug"), skip(self), fields(user_id = %user_id))]
    pub async fn profile(&self, user_id: Uuid) -> Result<User> {
        self.users.find_by_id(user_id).await?.ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn validate_registration(&self, registration: Registration) -> Result<NewUser> {
        let name = registration.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name is required".into()));
        }

        let email = normalize_email(&registration.email);
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::BadRequest("A valid email is required".into()));
        }

        if registration.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let role = registration.role.unwrap_or_default();
        if role == Role::Admin {
            return Err(AppError::BadRequest("Admin accounts cannot be self-registered".into()));
        }

        let password_hash = self.auth_service.hash_password(&registration.password).await?;

        Ok(NewUser {
            name,
            email,
            password_hash,
            role,
            avatar_url: registration.avatar_url.filter(|url| !url.trim().is_empty()),
        })
    }

    fn create_session(&self, user: User) -> Result<AuthSession> {
        let (jwt, expires_at) = self.auth_service.issue_token(user.id)?;
        Ok(AuthSession { token: jwt.0, expires_at, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::config::AuthConfig;

    fn setup_service() -> AccountService {
        let auth = AuthService::new(AuthConfig { jwt_secret: "test_secret".into(), access_token_ttl_secs: 3600 });
        AccountService::new(Arc::new(MemoryStore::new()), auth)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Jane Recruiter".into(),
            email: email.into(),
            password: "correct horse".into(),
            role: Some(Role::Company),
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login_case_insensitive() {
        let service = setup_service();
        let session = service.register(registration("Jane@Example.com")).await.unwrap();
        assert_eq!(session.user.email, "jane@example.com");
        assert_eq!(session.user.role, Role::Company);

        let login = service.login("JANE@example.com".into(), "correct horse".into()).await.unwrap();
        assert_eq!(login.user.id, session.user.id);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = setup_service();
        service.register(registration("jane@example.com")).await.unwrap();

        let result = service.login("jane@example.com".into(), "wrong password".into()).await;
        assert!(matches!(result, Err(AppError::AuthError)));
    }

    #[tokio::test]
    async fn test_register_rejects_admin_and_short_password() {
        let service = setup_service();

        let mut admin = registration("root@example.com");
        admin.role = Some(Role::Admin);
        assert!(matches!(service.register(admin).await, Err(AppError::BadRequest(_))));

        let mut short = registration("short@example.com");
        short.password = "abc".into();
        assert!(matches!(service.register(short).await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_profile_lookup() {
        let service = setup_service();
        let session = service.register(registration("jane@example.com")).await.unwrap();

        let profile = service.profile(session.user.id).await.unwrap();
        assert_eq!(profile.name, "Jane Recruiter");
        assert_eq!(profile.created_at, session.user.created_at);

        assert!(matches!(service.profile(Uuid::new_v4()).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let service = setup_service();
        service.register(registration("jane@example.com")).await.unwrap();

        let result = service.register(registration("JANE@example.com")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
