use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// Every failure the auth core can hand back to the HTTP layer.
///
/// `InvalidToken` and `Expired` collapse to the same 403 for callers but stay
/// separate variants so logs can tell them apart.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("user already exists")]
    Conflict,
    #[error("user not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredential,
    #[error("no token presented")]
    Unauthenticated,
    #[error("invalid token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
    #[error("role not permitted")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Conflict => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredential | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InvalidToken(_) | Self::Expired | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Conflict => "User already exists".into(),
            Self::NotFound => "User not found".into(),
            Self::InvalidCredential => "Invalid credentials".into(),
            Self::Unauthenticated => "Token is required".into(),
            Self::InvalidToken(_) | Self::Expired => "Invalid or expired token".into(),
            Self::Forbidden => "Access denied".into(),
            Self::Validation(msg) => msg.clone(),
            Self::Storage(_) | Self::Internal(_) => "Internal server error".into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Storage(e) = &self {
            error!(error = %e, "storage failure");
        } else if let Self::Internal(e) = &self {
            error!(error = %e, "internal failure");
        }
        json_error(self.status(), self.public_message())
    }
}

/// `{"error": "..."}` body shared by every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

pub(crate) fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        error: message.into(),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_http_contract() {
        assert_eq!(AuthError::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(AuthError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AuthError::InvalidCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Expired.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::Storage(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn storage_details_are_not_leaked() {
        let resp = AuthError::Storage(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }
}
