use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest},
    jwt::TokenService,
    password::{hash_password, verify_password},
    repo_types::{NewUser, User},
};
use crate::{error::ApiError, store::Store};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Turns a bearer token into the full user record it was issued for.
///
/// Every failure, including a valid token whose user has since been deleted,
/// is reported as `Unauthenticated`.
pub async fn resolve_identity(
    tokens: &TokenService,
    store: &dyn Store,
    token: &str,
) -> Result<User, ApiError> {
    let user_id = tokens.verify(token).map_err(|e| {
        warn!("invalid or expired token");
        ApiError::from(e)
    })?;

    match store.find_user(user_id).await? {
        Some(user) => Ok(user),
        None => {
            warn!(user_id, "token subject no longer exists");
            Err(ApiError::Unauthenticated)
        }
    }
}

/// Creates the account. Emails are stored exactly as given.
pub async fn register_user(store: &dyn Store, req: RegisterRequest) -> Result<User, ApiError> {
    if !is_valid_email(&req.email) {
        warn!(email = %req.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    require_non_blank("name", &req.name)?;
    require_non_blank("phone", &req.phone)?;

    if store.find_user_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = hash_password(&req.password)?;
    let user = store
        .create_user(NewUser {
            name: req.name,
            email: req.email,
            phone: req.phone,
            role: req.role,
            password_hash,
        })
        .await?;

    info!(user_id = user.id, email = %user.email, role = ?user.role, "user registered");
    Ok(user)
}

/// Checks credentials and issues an access token.
pub async fn login_user(
    tokens: &TokenService,
    store: &dyn Store,
    req: LoginRequest,
) -> Result<String, ApiError> {
    if !is_valid_email(&req.email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    let user = match store.find_user_by_email(&req.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %req.email, "login unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = tokens.issue_access(user.id)?;
    debug!(user_id = user.id, "access token issued");
    info!(user_id = user.id, "user logged in");
    Ok(token)
}
