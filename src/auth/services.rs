use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        password::{hash_password_blocking, verify_password_blocking},
        AuthError,
    },
    error::AppError,
    state::AppState,
    users::repo_types::{NewUser, UserChanges},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalizes `email` in place and rejects anything that is not an address.
pub(crate) fn validate_email(email: &mut String) -> Result<(), AppError> {
    *email = normalize_email(email);
    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

pub(crate) fn validate_price(price: Option<f64>) -> Result<(), AppError> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => Err(AppError::Validation(
            "pricePerHour must be a non-negative number".into(),
        )),
        _ => Ok(()),
    }
}

/// Creates the account and returns its first token.
pub async fn register_user(state: &AppState, mut req: RegisterRequest) -> Result<String, AppError> {
    validate_email(&mut req.email)?;
    validate_password(&req.password)?;
    validate_price(req.price_per_hour)?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password_blocking(req.password).await?;

    // Elevated tokens are never issued.
    let id = Uuid::new_v4();
    let token = state.keys.issue(id, false)?;

    // A concurrent registration that passed the pre-check loses here with
    // `StoreError::DuplicateEmail`, which answers 409.
    let user = state
        .users
        .insert(NewUser {
            id,
            name: req.name,
            email: req.email,
            image: req.image,
            address: req.address,
            phone_number: req.phone_number,
            user_skills: req.user_skills,
            price_per_hour: req.price_per_hour,
            password_hash,
            auth_token: Some(token.clone()),
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(token)
}

/// Unknown email and wrong password fail identically.
pub async fn login_user(state: &AppState, req: LoginRequest) -> Result<String, AppError> {
    let email = normalize_email(&req.email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.keys.issue(user.id, false)?;
    state
        .users
        .update_by_id(user.id, UserChanges::auth_token(token.clone()))
        .await?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(token)
}
