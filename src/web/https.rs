use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::SharedState;

/// Where a plain http request should be sent instead, if anywhere.
///
/// Only the proxy's `X-Forwarded-Proto` is trusted; the service itself never terminates TLS.
pub fn https_location(req: &Request) -> Option<String> {
    let proto = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    if proto.eq_ignore_ascii_case("https") {
        return None;
    }

    let host = req.headers().get(header::HOST)?.to_str().ok()?;
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Some(format!("https://{host}{path}"))
}

pub async fn redirect_to_https(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    // load balancer probes talk plain http
    if state.force_https && req.uri().path() != "/health" {
        if let Some(location) = https_location(&req) {
            return (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response();
        }
    }

    next.run(req).await
}
