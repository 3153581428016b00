//! Authentication port - verification of identity-provider tokens.

/// Claims carried by an identity-provider token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub subject: String,
    pub email: Option<String>,
    pub exp: i64,
}

/// Token verification. Issuing tokens is the identity provider's job.
pub trait TokenService: Send + Sync {
    /// Validate and decode a bearer token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Insufficient permissions")]
    InsufficientPermissions,
}
