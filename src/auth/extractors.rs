use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;
use uuid::Uuid;

use super::{claims::Identity, jwt::JwtKeys, AuthError};
use crate::error::AppError;

/// Caller identity for routes behind the token gate.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub is_admin: bool,
}

/// The raw header value is the token; no scheme prefix is stripped.
pub fn authorize(headers: &HeaderMap, keys: &JwtKeys) -> Result<Identity, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingToken)?;
    let token = value.to_str().map_err(|_| AuthError::InvalidToken)?;
    keys.verify(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        match authorize(&parts.headers, &keys) {
            Ok(identity) => Ok(AuthUser {
                user_id: identity.user_id,
                is_admin: identity.is_admin,
            }),
            Err(e) => {
                warn!(error = %e, "request rejected by auth gate");
                Err(e.into())
            }
        }
    }
}
