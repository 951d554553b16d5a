use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{info, warn};

use super::{claims::Claims, error::AuthError, jwt::JwtKeys};

/// Pulls the token out of an `Authorization: Bearer <token>` value.
/// Anything else counts as no token at all.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

pub fn require_authentication(keys: &JwtKeys, token: Option<&str>) -> Result<Claims, AuthError> {
    let Some(token) = token else {
        info!("request without token");
        return Err(AuthError::Unauthenticated);
    };
    keys.verify(token).map_err(|e| {
        match &e {
            AuthError::Expired => info!("rejected expired token"),
            AuthError::InvalidToken(cause) => warn!(error = %cause, "rejected invalid token"),
            _ => {}
        }
        e
    })
}

/// Exact, case-sensitive match. No hierarchy: "admin" does not imply "user".
pub fn require_role(claims: &Claims, expected: &str) -> Result<(), AuthError> {
    if claims.role == expected {
        return Ok(());
    }
    warn!(
        user_id = claims.user_id,
        role = %claims.role,
        required = %expected,
        "role check denied"
    );
    Err(AuthError::Forbidden)
}

/// Authenticated caller, with the verified token claims.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<JwtKeys>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<JwtKeys>::from_ref(state);
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let claims = require_authentication(&keys, bearer_token(header))?;
        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use axum::http::Request;
    use time::{Duration, OffsetDateTime};

    fn keys() -> Arc<JwtKeys> {
        Arc::new(JwtKeys::from_config(&JwtConfig {
            secret: "gate-secret".into(),
            ttl_minutes: 60,
        }))
    }

    fn claims(role: &str) -> Claims {
        Claims {
            user_id: 1,
            username: "alice".into(),
            role: role.into(),
            iat: 0,
            exp: i64::MAX,
        }
    }

    async fn extract(keys: &Arc<JwtKeys>, auth: Option<&str>) -> Result<AuthUser, AuthError> {
        let mut req = Request::builder().uri("/");
        if let Some(value) = auth {
            req = req.header(AUTHORIZATION, value);
        }
        let (mut parts, _) = req.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, keys).await
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("  Bearer   abc  ")), Some("abc"));
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(Some("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(Some("abc")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn missing_token_is_unauthenticated_not_invalid() {
        let err = require_authentication(&keys(), None).unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let err = require_authentication(&keys(), Some("garbage")).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn expired_token_is_distinguished_from_invalid() {
        let keys = keys();
        let token = keys
            .issue_at(1, "alice", "user", OffsetDateTime::now_utc() - Duration::hours(2))
            .unwrap();
        let err = require_authentication(&keys, Some(&token)).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn require_role_is_exact() {
        assert!(require_role(&claims("admin"), "admin").is_ok());
        for (have, want) in [("user", "admin"), ("Admin", "admin"), ("admin ", "admin"), ("admin", "user"), ("", "admin")] {
            assert!(
                matches!(require_role(&claims(have), want), Err(AuthError::Forbidden)),
                "{have:?} vs {want:?}"
            );
        }
    }

    #[tokio::test]
    async fn extractor_yields_claims_for_valid_bearer() {
        let keys = keys();
        let token = keys.issue(9, "bob", "admin").unwrap();
        let AuthUser(claims) = extract(&keys, Some(&format!("Bearer {token}")))
            .await
            .ok()
            .expect("valid token should pass");
        assert_eq!(claims.user_id, 9);
        assert_eq!(claims.role, "admin");
    }

    #[tokio::test]
    async fn extractor_rejections() {
        let keys = keys();
        assert!(matches!(extract(&keys, None).await, Err(AuthError::Unauthenticated)));
        assert!(matches!(
            extract(&keys, Some("Token abc")).await,
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            extract(&keys, Some("Bearer abc.def.ghi")).await,
            Err(AuthError::InvalidToken(_))
        ));
    }
}
