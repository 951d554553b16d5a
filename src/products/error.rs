use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::auth::error::{json_error, AuthError};

#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Validation(String),
    #[error("product already exists")]
    Conflict,
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        match self {
            Self::Auth(e) => e.into_response(),
            Self::Validation(msg) => json_error(StatusCode::BAD_REQUEST, msg),
            Self::Conflict => json_error(StatusCode::CONFLICT, "Product already exists"),
            Self::Storage(e) => {
                error!(error = %e, "product storage failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}
