use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    time::Duration,
};

use anyhow::Context;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use tracing::warn;

use crate::{auth::error::json_error, config::RateLimitConfig, state::AppState};

/// Per client IP request budget.
///
/// A client may spend the whole budget at once; after that capacity comes back
/// evenly over the window, so no IP ever gets more than `max_requests` in one window.
pub struct ClientRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    max_requests: u32,
}

impl ClientRateLimiter {
    pub fn from_config(config: &RateLimitConfig) -> anyhow::Result<Self> {
        let burst = NonZeroU32::new(config.max_requests)
            .context("rate limit must allow at least one request")?;
        let period = Duration::from_secs(config.window_secs) / config.max_requests;
        let quota = Quota::with_period(period)
            .context("rate limit window is too short")?
            .allow_burst(burst);

        Ok(Self {
            limiter: RateLimiter::keyed(quota),
            max_requests: config.max_requests,
        })
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// `Err` holds how long `ip` has to wait before its next request is accepted.
    pub fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        self.limiter
            .check_key(&ip)
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }

    /// Drops state for clients whose budget has fully refilled.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

/// Middleware applied to every route, the fallback included.
pub async fn limit_by_ip(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let ip = addr.ip();
    match state.limiter.check(ip) {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            let retry_after = wait.as_secs().max(1);
            warn!(client_ip = %ip, retry_after, "rate limit exceeded");

            let mut res = json_error(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later.",
            );
            let headers = res.headers_mut();
            headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
            headers.insert(
                "x-ratelimit-limit",
                HeaderValue::from(state.limiter.max_requests()),
            );
            res
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> ClientRateLimiter {
        ClientRateLimiter::from_config(&RateLimitConfig {
            max_requests,
            window_secs,
        })
        .unwrap()
    }

    #[test]
    fn budget_is_spent_then_refused() {
        let limiter = limiter(3, 900);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.check(ip).is_ok());
        }
        let wait = limiter.check(ip).unwrap_err();
        assert!(wait > Duration::ZERO);
        // one request's share of the window, never the whole window
        assert!(wait <= Duration::from_secs(300));
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = limiter(1, 60);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(a).is_ok());
        assert!(limiter.check(a).is_err());
        assert!(limiter.check(b).is_ok());
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn default_budget_is_one_hundred_per_quarter_hour() {
        let limiter = ClientRateLimiter::from_config(&RateLimitConfig::default()).unwrap();
        let ip: IpAddr = "::1".parse().unwrap();

        assert_eq!(limiter.max_requests(), 100);
        assert!((0..100).all(|_| limiter.check(ip).is_ok()));
        assert!(limiter.check(ip).is_err());
    }
}
