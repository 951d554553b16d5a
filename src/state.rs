use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{
    auth::{jwt::JwtKeys, password::PasswordService},
    config::AppConfig,
    db,
    rate_limit::ClientRateLimiter,
};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub keys: Arc<JwtKeys>,
    pub passwords: PasswordService,
    pub limiter: Arc<ClientRateLimiter>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let db = db::connect(&config.database_url).await?;
        db::migrate(&db).await?;
        Self::from_parts(db, config)
    }

    /// Derives keys and hasher from `config`; nothing here is mutated afterwards.
    pub fn from_parts(db: SqlitePool, config: AppConfig) -> anyhow::Result<Self> {
        let keys = Arc::new(JwtKeys::from_config(&config.jwt));
        let passwords = PasswordService::from_config(&config.password)?;
        let limiter = Arc::new(ClientRateLimiter::from_config(&config.rate_limit)?);
        Ok(Self {
            db,
            config: Arc::new(config),
            keys,
            passwords,
            limiter,
        })
    }

    /// In-memory database, fixed secret and cheap argon2 cost.
    #[cfg(test)]
    pub async fn fake() -> Self {
        use crate::config::{JwtConfig, PasswordConfig, RateLimitConfig};

        let config = AppConfig {
            database_url: "sqlite::memory:".into(),
            host: "127.0.0.1".into(),
            port: 0,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                ttl_minutes: 60,
            },
            password: PasswordConfig {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
            rate_limit: RateLimitConfig::default(),
        };
        Self::from_parts(db::test_pool().await, config).expect("test state")
    }
}
