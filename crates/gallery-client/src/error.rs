//! Error types for gallery operations

/// Errors surfaced to callers of the gallery client.
///
/// Rate limiting never appears here: both backoff loops absorb it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Credential or token endpoint failure; see `gallery_auth::Error`.
    #[error(transparent)]
    Auth(gallery_auth::Error),

    /// The API answered with an `error` payload where it is not recoverable.
    #[error("upstream error during {context}: {description}")]
    UpstreamPayload { context: String, description: String },

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Config(#[from] common::Error),
}

impl Error {
    pub fn is_fatal_authorization(&self) -> bool {
        matches!(self, Error::Auth(e) if e.is_fatal_authorization())
    }
}

impl From<gallery_auth::Error> for Error {
    fn from(err: gallery_auth::Error) -> Self {
        match err {
            gallery_auth::Error::Transport(msg) => Error::Transport(msg),
            other => Error::Auth(other),
        }
    }
}

/// Result alias for gallery operations.
pub type Result<T> = std::result::Result<T, Error>;
