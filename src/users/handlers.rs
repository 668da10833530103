use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        password::hash_password_blocking,
        services::{validate_email, validate_password, validate_price},
    },
    error::AppError,
    extract::AppJson,
    state::AppState,
    users::{
        dto::{
            DeletedUserResponse, UpdateUserRequest, UpdatedUserResponse, UserResponse,
            UsersResponse,
        },
        repo_types::UserChanges,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/user/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// An id that is not a UUID cannot name any record.
fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| {
        warn!(id = %raw, "malformed user id");
        AppError::NotFound
    })
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let id = parse_user_id(&id)?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(UserResponse {
        message: "User data retrieved successfully",
        user,
    }))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, AppError> {
    let users = state.users.find_all().await?;
    Ok(Json(UsersResponse { users }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedUserResponse>, AppError> {
    let id = parse_user_id(&id)?;
    let deleted_user = state
        .users
        .delete_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;

    info!(user_id = %deleted_user.id, "user deleted");
    Ok(Json(DeletedUserResponse {
        message: "User deleted successfully",
        deleted_user,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(mut payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UpdatedUserResponse>, AppError> {
    let id = parse_user_id(&id)?;

    if let Some(email) = payload.email.as_mut() {
        validate_email(email)?;
        if let Some(other) = state.users.find_by_email(email).await? {
            if other.id != id {
                warn!(email = %email, "email already registered");
                return Err(AppError::Conflict("Email already registered".into()));
            }
        }
    }
    validate_price(payload.price_per_hour.flatten())?;

    let password_hash = match payload.password {
        Some(password) => {
            validate_password(&password)?;
            Some(hash_password_blocking(password).await?)
        }
        None => None,
    };

    let changes = UserChanges {
        name: payload.name,
        email: payload.email,
        image: payload.image,
        address: payload.address,
        phone_number: payload.phone_number,
        user_skills: payload.user_skills,
        price_per_hour: payload.price_per_hour,
        password_hash,
        auth_token: None,
    };

    let updated_user = state
        .users
        .update_by_id(id, changes)
        .await?
        .ok_or(AppError::NotFound)?;

    info!(user_id = %updated_user.id, "user updated");
    Ok(Json(UpdatedUserResponse {
        message: "User updated successfully",
        updated_user,
    }))
}
