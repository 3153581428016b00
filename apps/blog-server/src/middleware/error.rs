//! Error handling - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use folio_core::{DomainError, RepoError};
use folio_shared::ErrorResponse;
use std::fmt;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Validation(Vec<String>),
    /// No document store behind the repository.
    NotConfigured(String),
    /// The document store failed; the message is passed on as is.
    Store(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Validation(errors) => write!(f, "Validation errors: {:?}", errors),
            AppError::NotConfigured(msg) => write!(f, "Not configured: {}", msg),
            AppError::Store(msg) => write!(f, "Store error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Validation(errors) => {
                ErrorResponse::new(422, "Validation Failed").with_detail(errors.join(", "))
            }
            AppError::NotConfigured(detail) => ErrorResponse::not_configured(detail),
            AppError::Store(detail) => ErrorResponse::store_unavailable(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(vec![msg]),
            DomainError::UnsupportedLocale(code) => {
                AppError::NotFound(format!("Unsupported locale: {}", code))
            }
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotConfigured(reason) => AppError::NotConfigured(reason),
            RepoError::Store(e) => {
                tracing::error!(error = %e, "Document store error");
                AppError::Store(e.to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::StoreError;

    #[test]
    fn test_domain_and_repo_errors_map_to_statuses() {
        let cases = [
            (AppError::from(DomainError::Validation("title is empty".into())), 422),
            (AppError::from(DomainError::UnsupportedLocale("de".into())), 404),
            (AppError::from(RepoError::NotConfigured("no store".into())), 503),
            (
                AppError::from(RepoError::Store(StoreError::Connection("refused".into()))),
                502,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.status_code().as_u16(), status, "{error}");
        }
    }

    #[test]
    fn test_store_message_is_passed_through() {
        let error = AppError::from(RepoError::Store(StoreError::Connection("refused".into())));
        assert_eq!(error.to_string(), "Store error: Store connection failed: refused");
    }
}
