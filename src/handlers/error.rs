//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::utils::errors::{CampusHubError, ErrorCategory};

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError(pub CampusHubError);

impl From<CampusHubError> for ApiError {
    fn from(err: CampusHubError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if matches!(self.0, CampusHubError::Conflict(_)) {
            return StatusCode::CONFLICT;
        }
        match self.0.category() {
            ErrorCategory::Authentication => StatusCode::UNAUTHORIZED,
            ErrorCategory::Authorization => StatusCode::FORBIDDEN,
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Consistency | ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, severity = %self.0.severity(), "Request failed");
        }

        let body = Json(json!({
            "error": self.0.user_message(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = std::result::Result<T, ApiError>;
