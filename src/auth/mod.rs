use axum::Router;
use thiserror::Error;

use crate::state::AppState;

pub mod claims;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod services;

/// Failures of the credential and token flow.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authorization token missing")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("token configuration error: {0}")]
    Configuration(String),

    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
