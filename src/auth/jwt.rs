use std::sync::Arc;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::{claims::Claims, error::AuthError},
    config::JwtConfig,
    state::AppState,
};

/// Signing and verification keys for HS256 session tokens.
///
/// Built once at startup and shared read-only through `AppState`.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl FromRef<AppState> for Arc<JwtKeys> {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        // Only HS256 is accepted; tokens claiming any other alg fail before the MAC check.
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in `verify_at` so `now == exp` is already expired.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: i64, username: &str, role: &str) -> Result<String, AuthError> {
        self.issue_at(user_id, username, role, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        user_id: i64,
        username: &str,
        role: &str,
        now: OffsetDateTime,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            user_id,
            username: username.to_owned(),
            role: role.to_owned(),
            iat: now.unix_timestamp(),
            exp: (now + self.ttl).unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| anyhow::Error::from(e).context("sign session token"))?;
        debug!(user_id, role = %role, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Signature and structure first, then expiry against `now`.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, AuthError> {
        let data =
            decode::<Claims>(token, &self.decoding, &self.validation).map_err(AuthError::InvalidToken)?;
        if now.unix_timestamp() >= data.claims.exp {
            return Err(AuthError::Expired);
        }
        debug!(user_id = data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}
