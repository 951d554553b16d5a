use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::{
    auth::{error::AuthError, repo_types::User},
    db::is_unique_violation,
};

impl User {
    /// Find a user by username.
    pub async fn find_by_username(db: &SqlitePool, username: &str) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?
        .ok_or(AuthError::NotFound)
    }

    async fn username_taken(db: &SqlitePool, username: &str) -> Result<bool, AuthError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(db)
            .await?;
        Ok(row.is_some())
    }

    /// Insert a new user and return its id.
    ///
    /// The existence check only saves a round of work; the UNIQUE constraint on
    /// `username` decides races, and both paths report `Conflict`.
    pub async fn register(
        db: &SqlitePool,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<i64, AuthError> {
        if Self::username_taken(db, username).await? {
            warn!(username = %username, "username already registered");
            return Err(AuthError::Conflict);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .execute(db)
        .await;

        match inserted {
            Ok(done) => {
                let id = done.last_insert_rowid();
                debug!(user_id = id, username = %username, "user row inserted");
                Ok(id)
            }
            Err(e) if is_unique_violation(&e) => {
                warn!(username = %username, "username taken concurrently");
                Err(AuthError::Conflict)
            }
            Err(e) => Err(AuthError::Storage(e)),
        }
    }
}
