use crate::state::AppState;
use axum::Router;

pub mod claims;
mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
mod repo;
pub mod repo_types;

/// Role required for catalog writes.
pub const ADMIN_ROLE: &str = "admin";

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
