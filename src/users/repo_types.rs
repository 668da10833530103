use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid, // never updated
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub user_skills: Vec<String>,
    pub price_per_hour: Option<f64>,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    #[serde(skip_serializing)]
    pub auth_token: Option<String>, // last issued token, not used for verification
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Fields supplied on insert; the store fills in timestamps.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub user_skills: Vec<String>,
    pub price_per_hour: Option<f64>,
    pub password_hash: String,
    pub auth_token: Option<String>,
}

/// Partial update. Outer `None` leaves the stored value untouched; for the
/// nullable columns `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<Option<String>>,
    pub email: Option<String>,
    pub image: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub phone_number: Option<Option<String>>,
    pub user_skills: Option<Vec<String>>,
    pub price_per_hour: Option<Option<f64>>,
    pub password_hash: Option<String>,
    pub auth_token: Option<String>,
}

impl UserChanges {
    pub fn auth_token(token: impl Into<String>) -> Self {
        Self {
            auth_token: Some(token.into()),
            ..Self::default()
        }
    }
}
