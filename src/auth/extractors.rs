use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::{jwt::TokenService, repo_types::User, services::resolve_identity};
use crate::{error::ApiError, state::AppState};

/// The authenticated caller, re-resolved from storage on every request.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                warn!("missing Authorization header");
                ApiError::Unauthenticated
            })?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| {
                warn!("invalid auth scheme");
                ApiError::Unauthenticated
            })?;

        let tokens = TokenService::from_ref(state);
        let user = resolve_identity(&tokens, state.store.as_ref(), token.trim()).await?;
        Ok(CurrentUser(user))
    }
}
