//! Admin authentication extractor.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header};
use std::future::{Ready, ready};
use std::sync::Arc;

use folio_core::ports::{AuthError, TokenClaims, TokenService};
use folio_shared::ErrorResponse;

/// Who may perform administrative writes.
///
/// An empty owner list admits any holder of a valid token. Otherwise the
/// token's email must match a listed address exactly.
#[derive(Debug, Clone, Default)]
pub struct OwnerPolicy {
    owner_emails: Vec<String>,
}

impl OwnerPolicy {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            owner_emails: emails
                .into_iter()
                .map(|email| email.as_ref().trim().to_string())
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }

    /// Comma-separated addresses, blanks ignored.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn is_open(&self) -> bool {
        self.owner_emails.is_empty()
    }

    pub fn allows(&self, claims: &TokenClaims) -> bool {
        if self.is_open() {
            return true;
        }
        claims
            .email
            .as_deref()
            .is_some_and(|email| self.owner_emails.iter().any(|owner| owner == email))
    }
}

/// A verified site owner. Use as a handler argument to gate a route:
/// ```ignore
/// async fn delete_post(admin: AdminIdentity, ...) -> AppResult<HttpResponse> { ... }
/// ```
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub subject: String,
    pub email: Option<String>,
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match &self.0 {
            AuthError::InsufficientPermissions => actix_web::http::StatusCode::FORBIDDEN,
            _ => actix_web::http::StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your authentication token has expired. Please sign in again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
            AuthError::InsufficientPermissions => ErrorResponse::forbidden(),
        };

        actix_web::HttpResponse::build(self.status_code()).json(error)
    }
}

fn authenticate(req: &HttpRequest) -> Result<AdminIdentity, AuthError> {
    let token_service = req
        .app_data::<actix_web::web::Data<Arc<dyn TokenService>>>()
        .ok_or_else(|| {
            tracing::error!("TokenService not found in app data");
            AuthError::InvalidToken("Server configuration error".to_string())
        })?;

    let auth_str = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    let claims = token_service.validate_token(token)?;

    let policy = req
        .app_data::<actix_web::web::Data<OwnerPolicy>>()
        .ok_or_else(|| {
            tracing::error!("OwnerPolicy not found in app data");
            AuthError::InvalidToken("Server configuration error".to_string())
        })?;
    if !policy.allows(&claims) {
        tracing::warn!(subject = %claims.subject, "Token holder is not a site owner");
        return Err(AuthError::InsufficientPermissions);
    }

    tracing::debug!(subject = %claims.subject, "Admin authenticated");
    Ok(AdminIdentity {
        subject: claims.subject,
        email: claims.email,
    })
}

impl FromRequest for AdminIdentity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(AuthenticationError))
    }
}
