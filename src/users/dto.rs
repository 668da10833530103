use serde::{Deserialize, Deserializer, Serialize};

use crate::users::repo_types::User;

/// Present-but-null becomes `Some(None)`; an absent key stays `None` via
/// `#[serde(default)]`.
fn nullable<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

/// Request body for `PUT /user/:id`. Absent fields keep their stored value;
/// an explicit `null` clears the optional profile fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone_number: Option<Option<String>>,
    pub user_skills: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub price_per_hour: Option<Option<f64>>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedUserResponse {
    pub message: &'static str,
    pub deleted_user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedUserResponse {
    pub message: &'static str,
    pub updated_user: User,
}
