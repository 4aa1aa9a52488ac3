use crate::domain::user::User;
use crate::error::AppError;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRecord {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) role: String,
    pub(crate) avatar_url: Option<String>,
    pub(crate) created_at: OffsetDateTime,
}

impl TryFrom<UserRecord> for User {
    type Error = AppError;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        let role = record.role.parse().map_err(AppError::InternalMsg)?;
        Ok(Self {
            id: record.id,
            name: record.name,
            email: record.email,
            password_hash: record.password_hash,
            role,
            avatar_url: record.avatar_url,
            created_at: record.created_at,
        })
    }
}
