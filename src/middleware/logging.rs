//! Logging middleware
//!
//! Records method, path, status and latency for every request.

use std::time::Instant;

use axum::{http::Request, middleware::Next, response::Response};
use tracing::{info, warn};

pub async fn request_logging(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let duration_ms = started.elapsed().as_millis() as u64;
    if status.is_server_error() {
        warn!(method = %method, path = %path, status = status.as_u16(), duration_ms = duration_ms, "Request failed");
    } else {
        info!(method = %method, path = %path, status = status.as_u16(), duration_ms = duration_ms, "Request handled");
    }
    response
}
