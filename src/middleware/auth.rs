//! Authentication middleware
//!
//! Resolves the `Authorization: Bearer <identity token>` header into an
//! [`Actor`] and stores it in the request extensions.

use axum::{
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::handlers::error::ApiError;
use crate::state::AppState;
use crate::utils::errors::CampusHubError;

/// Identity token from the `Authorization` header, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Reject requests without an identity; resolve the rest into an `Actor`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or(CampusHubError::Unauthenticated)?;

    let actor = state.services.identity_service.resolve_identity(Some(token)).await?;
    debug!(
        user_id = ?actor.user().map(|u| u.id),
        path = %req.uri().path(),
        "Request authenticated"
    );

    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}
