use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pls_core::AppError;

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvariantViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let payload = Json(ErrorResponse::new(self.0.to_string()));

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use pls_core::AppError;

    use super::ApiError;

    #[test]
    fn error_categories_map_to_distinct_statuses() {
        let cases = [
            (AppError::Validation(String::new()), StatusCode::BAD_REQUEST),
            (
                AppError::InvariantViolation(String::new()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::NotFound(String::new()), StatusCode::NOT_FOUND),
            (AppError::Conflict(String::new()), StatusCode::CONFLICT),
            (AppError::Unauthorized(String::new()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden(String::new()), StatusCode::FORBIDDEN),
            (
                AppError::StoreUnavailable(String::new()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Internal(String::new()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError(error).into_response().status(), expected);
        }
    }
}
