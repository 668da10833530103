use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, User, UserChanges};

/// Failures of the writing operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    fn from_sqlx(e: sqlx::Error, what: &'static str) -> Self {
        match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            other => StoreError::Other(anyhow::Error::new(other).context(what)),
        }
    }
}

/// Persistence boundary for user records.
///
/// Lookups return `Ok(None)` when nothing matches; callers decide what an
/// absent record means.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
    async fn update_by_id(&self, id: Uuid, changes: UserChanges)
        -> Result<Option<User>, StoreError>;
    async fn delete_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_all(&self) -> anyhow::Result<Vec<User>>;
}

const USER_COLUMNS: &str = "id, name, email, image, address, phone_number, user_skills, \
     price_per_hour, password_hash, auth_token, created_at, updated_at";

// (whether to write the column, the value written)
fn nullable<T>(change: Option<Option<T>>) -> (bool, Option<T>) {
    (change.is_some(), change.flatten())
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, image, address, phone_number, user_skills,
                               price_per_hour, password_hash, auth_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(user.name)
        .bind(user.email)
        .bind(user.image)
        .bind(user.address)
        .bind(user.phone_number)
        .bind(user.user_skills)
        .bind(user.price_per_hour)
        .bind(user.password_hash)
        .bind(user.auth_token)
        .fetch_one(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "insert user"))?;
        Ok(user)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let (set_name, name) = nullable(changes.name);
        let (set_image, image) = nullable(changes.image);
        let (set_address, address) = nullable(changes.address);
        let (set_phone, phone_number) = nullable(changes.phone_number);
        let (set_price, price_per_hour) = nullable(changes.price_per_hour);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET name           = CASE WHEN $2 THEN $3 ELSE name END,
                   image          = CASE WHEN $4 THEN $5 ELSE image END,
                   address        = CASE WHEN $6 THEN $7 ELSE address END,
                   phone_number   = CASE WHEN $8 THEN $9 ELSE phone_number END,
                   price_per_hour = CASE WHEN $10 THEN $11 ELSE price_per_hour END,
                   email          = COALESCE($12, email),
                   user_skills    = COALESCE($13, user_skills),
                   password_hash  = COALESCE($14, password_hash),
                   auth_token     = COALESCE($15, auth_token),
                   updated_at     = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(set_name)
        .bind(name)
        .bind(set_image)
        .bind(image)
        .bind(set_address)
        .bind(address)
        .bind(set_phone)
        .bind(phone_number)
        .bind(set_price)
        .bind(price_per_hour)
        .bind(changes.email)
        .bind(changes.user_skills)
        .bind(changes.password_hash)
        .bind(changes.auth_token)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "update user"))?;
        Ok(user)
    }

    async fn delete_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("delete user")?;
        Ok(user)
    }

    async fn find_all(&self) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(users)
    }
}
