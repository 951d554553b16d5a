use serde::{Deserialize, Serialize};

/// JWT payload carried by every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub role: String,
    pub iat: i64, // issued at (unix seconds)
    pub exp: i64, // expires at (unix seconds)
}
