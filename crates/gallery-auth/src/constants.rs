//! Gallery API endpoints and OAuth constants
//!
//! Paths are relative to the configured base URL so tests can point the
//! transport at a local server.

/// Production host serving both the OAuth and REST endpoints
pub const BASE_URL: &str = "https://www.deviantart.com";

/// Prefix shared by every authenticated REST endpoint
pub const API_PREFIX: &str = "/api/v1/oauth2";

/// Token endpoint for code exchange and token refresh
pub const TOKEN_PATH: &str = "/oauth2/token";

/// User-facing authorization page (out-of-band step that yields a code)
pub const AUTHORIZE_PATH: &str = "/oauth2/authorize";

/// Cheap access token validity check
pub const PLACEBO_PATH: &str = "/api/v1/oauth2/placebo";

/// Scope needed for gallery browsing and download links
pub const SCOPES: &str = "browse";

/// Identity slug under which credentials are stored
pub const DEFAULT_IDENTITY: &str = "deviantart";

/// `error_description` returned by the token endpoint for a used or bogus code.
pub const INVALID_CODE_MESSAGE: &str = "Incorrect authorization code.";
