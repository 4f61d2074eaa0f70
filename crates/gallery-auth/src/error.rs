//! Error types for credential and token operations

/// Errors from credential handling and token exchange.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No usable code/refresh token, or the token endpoint refused the
    /// exchange. Authenticated work cannot continue.
    #[error("authorization failed: {0}")]
    FatalAuthorization(String),

    /// The authorization code was rejected; the user must authorize again.
    #[error("authorization code rejected, authorize the application again: {0}")]
    NeedsReauthorization(String),

    #[error("no access token available")]
    MissingAccessToken,

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether the caller must stop all authenticated work.
    pub fn is_fatal_authorization(&self) -> bool {
        matches!(
            self,
            Error::FatalAuthorization(_) | Error::NeedsReauthorization(_)
        )
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
