use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, MeResponse, RegisterRequest, StatusResponse, TokenResponse, UserOut},
        extractors::CurrentUser,
        jwt::TokenService,
        services::{login_user, register_user},
    },
    error::ApiError,
    extract::JsonBody,
    state::AppState,
    summary::summarize,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).delete(delete_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<Json<UserOut>, ApiError> {
    let user = register_user(state.store.as_ref(), payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let tokens = TokenService::from_ref(&state);
    let token = login_user(&tokens, state.store.as_ref(), payload).await?;
    Ok(Json(TokenResponse::bearer(token)))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MeResponse>, ApiError> {
    let summary = summarize(state.store.as_ref(), user.id).await?;
    Ok(Json(MeResponse {
        user: user.into(),
        summary,
    }))
}

/// Removes the caller's account together with its cars and inspections.
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<StatusResponse>, ApiError> {
    if !state.store.delete_user(user.id).await? {
        // raced with another delete of the same account
        return Err(ApiError::Unauthenticated);
    }
    info!(user_id = user.id, "account deleted");
    Ok(Json(StatusResponse::deleted()))
}
