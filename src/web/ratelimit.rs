use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use super::SharedState;
use crate::{config::RateLimitConfig, covers::ErrorResponse};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Idle clients are dropped from the limiter maps once every this many checks.
const RETAIN_EVERY: u64 = 1024;

/// Per-client-ip quotas over the cover routes, all of which must admit a request.
pub struct RateLimits {
    limiters: Vec<(&'static str, DefaultKeyedRateLimiter<IpAddr>)>,
    trust_proxy: bool,
    checks: AtomicU64,
}

impl RateLimits {
    pub fn new(config: &RateLimitConfig) -> Self {
        let quotas = [
            ("second", NonZeroU32::new(config.per_second).map(Quota::per_second)),
            ("hour", NonZeroU32::new(config.per_hour).map(Quota::per_hour)),
            (
                "day",
                NonZeroU32::new(config.per_day).and_then(|n| {
                    Quota::with_period(DAY / n.get()).map(|quota| quota.allow_burst(n))
                }),
            ),
        ];

        let limiters = quotas
            .into_iter()
            .filter_map(|(window, quota)| quota.map(|q| (window, RateLimiter::keyed(q))))
            .collect();

        Self {
            limiters,
            trust_proxy: config.trust_proxy,
            checks: AtomicU64::new(0),
        }
    }

    /// Returns the window that rejected the request, if any.
    ///
    /// Windows are checked shortest first and checking stops at the first refusal.
    /// A request refused by the hourly or daily window has still spent a token of the
    /// shorter windows, which refill within a second or an hour; a burst refused per
    /// second never touches the hourly or daily budget.
    pub fn check(&self, ip: IpAddr) -> Result<(), &'static str> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % RETAIN_EVERY == RETAIN_EVERY - 1 {
            self.retain_recent();
        }

        for (window, limiter) in &self.limiters {
            if limiter.check_key(&ip).is_err() {
                return Err(*window);
            }
        }
        Ok(())
    }

    fn retain_recent(&self) {
        for (_, limiter) in &self.limiters {
            limiter.retain_recent();
        }
    }

    pub fn client_ip(&self, req: &Request) -> IpAddr {
        client_ip(req, self.trust_proxy)
    }
}

/// The socket peer, or the first `X-Forwarded-For` hop when the proxy in front is trusted.
pub fn client_ip(req: &Request, trust_proxy: bool) -> IpAddr {
    let forwarded = trust_proxy
        .then(|| req.headers().get("x-forwarded-for"))
        .flatten()
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    forwarded
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn limit_requests(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    let ip = state.limits.client_ip(&req);

    if let Err(window) = state.limits.check(ip) {
        log::warn!("rate limit exceeded for {ip} (per {window})");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new(
                "rate_limited",
                "Too many requests. Please wait before trying again.",
            )),
        )
            .into_response();
    }

    next.run(req).await
}
