use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        extractors::AuthUser,
        services::{login_user, register_user},
    },
    error::AppError,
    extract::AppJson,
    state::AppState,
    users::dto::UserResponse,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/protected-route", get(protected_route))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let auth_token = register_user(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            auth_token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let auth_token = login_user(&state, payload).await?;
    Ok(Json(AuthResponse {
        message: "Login successful",
        auth_token,
    }))
}

/// Token failures never reach this body; the gate answers them.
#[instrument(skip(state))]
pub async fn protected_route(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.find_by_id(auth.user_id).await?.ok_or_else(|| {
        warn!(user_id = %auth.user_id, "token subject no longer exists");
        AppError::NotFound
    })?;

    info!(user_id = %user.id, is_admin = auth.is_admin, "protected route accessed");
    Ok(Json(UserResponse {
        message: "Protected route accessed",
        user,
    }))
}
