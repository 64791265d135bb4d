use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{
    config::{JwtConfig, MAX_TTL_MINUTES},
    state::AppState,
};

/// JWT payload. `sub` is the user id in decimal, as JWT wants a string subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Bad signature, malformed payload, wrong issuer/audience and expiry all
/// collapse into this one kind.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token")]
    InvalidToken,
}

/// Issues and verifies HS256 access tokens with the process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        TokenService::new(&state.config.jwt)
    }
}

impl TokenService {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::minutes(cfg.ttl_minutes.clamp(1, MAX_TTL_MINUTES)),
        }
    }

    #[cfg(test)]
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Token for `user_id` with the configured lifetime.
    pub fn issue_access(&self, user_id: i64) -> anyhow::Result<String> {
        self.issue(user_id, self.access_ttl)
    }

    pub fn issue(&self, user_id: i64, ttl: Duration) -> anyhow::Result<String> {
        self.issue_at(user_id, ttl, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        user_id: i64,
        ttl: Duration,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = now.checked_add(ttl).context("token expiry out of range")?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    /// Returns the subject's user id.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Like [`verify`](Self::verify) with an explicit clock. A token is dead
    /// from its `exp` second onwards; there is no leeway.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<i64, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        // expiry is checked below against `now`, not the library's clock
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenError::InvalidToken
        })?;

        if data.claims.exp <= now.unix_timestamp() {
            debug!(exp = data.claims.exp, "jwt expired");
            return Err(TokenError::InvalidToken);
        }

        let user_id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::InvalidToken)?;
        debug!(user_id, "jwt verified");
        Ok(user_id)
    }
}
