use crate::adapters::database::DbPool;
use crate::adapters::database::records::UserRecord;
use crate::domain::repository::UserDirectory;
use crate::domain::user::{NewUser, User};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    #[tracing::instrument(level = "debug", skip(self, user))]
    async fn create(&self, user: NewUser) -> Result<User> {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, avatar_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, password_hash, role, avatar_url, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.avatar_url)
        .fetch_one(&mut *conn)
        .await;

        match result {
            Ok(record) => User::try_from(record),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23505") => {
                Err(AppError::Conflict("Email already in use".into()))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let mut conn = self.pool.acquire().await?;

        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, password_hash, role, avatar_url, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        record.map(User::try_from).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut conn = self.pool.acquire().await?;

        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, password_hash, role, avatar_url, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

        record.map(User::try_from).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self, ids), fields(count = ids.len()))]
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.acquire().await?;

        let records = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, password_hash, role, avatar_url, created_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;

        records.into_iter().map(User::try_from).collect()
    }
}
