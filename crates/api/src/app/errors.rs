use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use tradepost_core::DomainError;

pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP-facing error. Every failure renders as
/// `{"success": false, "error": <code>, "message": <detail>}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        let (status, code) = match err {
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            DomainError::InvalidId(_) => (StatusCode::BAD_REQUEST, "invalid_id"),
            DomainError::InvalidState(_) => (StatusCode::CONFLICT, "invalid_state"),
            DomainError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            DomainError::DuplicateField(_) => (StatusCode::CONFLICT, "duplicate_field"),
            DomainError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            DomainError::Unauthorized => (StatusCode::FORBIDDEN, "unauthorized"),
            DomainError::InvariantViolation(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invariant_violation")
            }
        };
        Self::new(status, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": self.code,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_field_maps_to_conflict() {
        let err = ApiError::from(DomainError::duplicate_field("tax_id"));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "duplicate_field");
    }

    #[test]
    fn not_found_and_unauthorized_statuses() {
        assert_eq!(
            ApiError::from(DomainError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DomainError::Unauthorized).status(),
            StatusCode::FORBIDDEN
        );
    }
}
