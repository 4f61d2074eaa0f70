//! OAuth credential lifecycle for the gallery API
//!
//! Holds the per-identity credential state, exchanges authorization codes
//! and refresh tokens at the token endpoint, and validates access before
//! every authenticated call.
//!
//! Credential flow:
//! 1. User opens `authorize::build_authorization_url()` and stores the code
//! 2. `CredentialState::from_store()` loads the identity's record
//! 3. `AccessGuard::ensure_access()` exchanges the code on first use
//! 4. Later calls probe the access token and refresh it when rejected
//! 5. Every exchange persists the new pair and drops the used code

pub mod authorize;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod state;
pub mod token;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use authorize::{build_authorization_url, generate_state};
pub use constants::*;
pub use credentials::{CredentialPersistence, CredentialStore, IdentityRecord, OAuthMaterial};
pub use error::{Error, Result};
pub use guard::AccessGuard;
pub use state::CredentialState;
pub use token::{GrantKind, TokenResponse, exchange};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, ReqwestTransport, UpstreamError};
