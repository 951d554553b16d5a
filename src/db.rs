use anyhow::Context;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

/// Applies the embedded migrations under `./migrations`.
pub async fn migrate(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}

/// True when the insert tripped a UNIQUE / PRIMARY KEY constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// In-memory database with the schema applied.
/// One connection that never idles out, so the data lives as long as the pool.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<std::time::Duration>)
        .max_lifetime(None::<std::time::Duration>)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite should open");
    migrate(&db).await.expect("migrations should apply");
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_insert_is_reported_as_unique_violation() {
        let db = test_pool().await;
        let insert = "INSERT INTO users (username, password_hash, role) VALUES ('dup', 'h', 'user')";

        sqlx::query(insert).execute(&db).await.unwrap();
        let err = sqlx::query(insert).execute(&db).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn other_errors_are_not_unique_violations() {
        let db = test_pool().await;
        let err = sqlx::query("SELECT * FROM no_such_table")
            .execute(&db)
            .await
            .unwrap_err();
        assert!(!is_unique_violation(&err));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
