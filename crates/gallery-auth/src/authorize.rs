//! Authorization URL for the out-of-band user consent step
//!
//! The user opens this URL, approves the application and is redirected to
//! `redirect_uri` with a `code` parameter. Storing that code under the
//! identity's `oauth.code` lets the first `ensure_access` call exchange it.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use reqwest::Url;

use crate::constants::{AUTHORIZE_PATH, SCOPES};
use crate::error::{Error, Result};

/// Random opaque `state` value for CSRF protection, URL-safe base64.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build the authorization page URL for `client_id`.
///
/// Every parameter is form-encoded, so a `redirect_uri` carrying its own
/// percent-escapes or non-ASCII text reaches the server byte for byte.
pub fn build_authorization_url(
    base_url: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> Result<String> {
    let endpoint = format!("{}{}", base_url.trim_end_matches('/'), AUTHORIZE_PATH);
    let url = Url::parse_with_params(
        &endpoint,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("scope", SCOPES),
            ("state", state),
        ],
    )
    .map_err(|e| Error::InvalidUrl(format!("{endpoint}: {e}")))?;
    Ok(url.into())
}
