mod app;
mod auth;
mod config;
mod db;
mod docs;
mod products;
mod rate_limit;
mod state;

use std::time::Duration;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "authcat=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init().await?;
    let (host, port) = (state.config.host.clone(), state.config.port);
    tracing::info!(
        jwt_ttl_minutes = state.keys.ttl().whole_minutes(),
        argon2_memory_kib = state.config.password.memory_kib,
        rate_limit_max_requests = state.config.rate_limit.max_requests,
        rate_limit_window_secs = state.config.rate_limit.window_secs,
        "configuration loaded"
    );

    let limiter = state.limiter.clone();
    let prune_every = Duration::from_secs(state.config.rate_limit.window_secs);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(prune_every);
        loop {
            tick.tick().await;
            limiter.retain_recent();
            tracing::debug!(clients = limiter.tracked_clients(), "rate limit state pruned");
        }
    });

    app::serve(app::build_app(state), &host, port).await
}
