//! Token endpoint exchange
//!
//! Trades either the one-time authorization code or the refresh token for a
//! new access/refresh pair. Both grants POST to `TOKEN_PATH` with the client
//! registration in the query string.

use serde::Deserialize;
use tracing::{info, warn};

use crate::constants::{INVALID_CODE_MESSAGE, TOKEN_PATH};
use crate::error::{Error, Result};
use crate::state::CredentialState;
use crate::transport::{ApiRequest, HttpTransport};

/// Which credential is traded at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantKind {
    AuthorizationCode,
    RefreshToken,
}

impl GrantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantKind::AuthorizationCode => "authorization_code",
            GrantKind::RefreshToken => "refresh_token",
        }
    }
}

/// Successful token endpoint payload.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Exchange a grant for a new token pair and install it into `state`.
///
/// A missing grant is fatal: without a code or refresh token only a new
/// user authorization can help. A rejected code on a failed response maps to
/// `NeedsReauthorization` and is never retried with the refresh token. Any
/// other `error` payload is `FatalAuthorization`.
pub async fn exchange(
    transport: &dyn HttpTransport,
    kind: GrantKind,
    state: &mut CredentialState,
    redirect_uri: &str,
) -> Result<()> {
    let grant_params: Vec<(&str, String)> = match kind {
        GrantKind::AuthorizationCode => {
            let code = state.authorization_code().ok_or_else(|| {
                Error::FatalAuthorization(
                    "no authorization code stored, authorize the application first".into(),
                )
            })?;
            vec![
                ("code", code.to_string()),
                ("redirect_uri", redirect_uri.to_string()),
            ]
        }
        GrantKind::RefreshToken => {
            let refresh = state.refresh_token().ok_or_else(|| {
                Error::FatalAuthorization("no refresh token stored".into())
            })?;
            vec![("refresh_token", refresh.to_string())]
        }
    };

    let mut request = ApiRequest::post(TOKEN_PATH)
        .with_query("client_id", state.client_id())
        .with_query("client_secret", state.client_secret())
        .with_query("grant_type", kind.as_str());
    for (key, value) in grant_params {
        request.set_query(key, value);
    }

    let response = transport.send(request).await?;

    if let Some(upstream) = response.upstream_error() {
        if !response.is_success() && upstream.description == INVALID_CODE_MESSAGE {
            warn!(identity = state.identity(), "authorization code rejected");
            return Err(Error::NeedsReauthorization(upstream.description));
        }
        warn!(
            identity = state.identity(),
            grant = kind.as_str(),
            error = %upstream.error,
            "token endpoint refused exchange"
        );
        return Err(Error::FatalAuthorization(upstream.message()));
    }

    if !response.is_success() {
        return Err(Error::Transport(format!(
            "token endpoint returned {}",
            response.status
        )));
    }

    let token: TokenResponse = serde_json::from_value(response.body)
        .map_err(|e| Error::FatalAuthorization(format!("invalid token response: {e}")))?;
    state
        .apply_exchange_result(token.access_token, token.refresh_token)
        .await?;

    info!(
        identity = state.identity(),
        grant = kind.as_str(),
        "token exchange succeeded"
    );
    Ok(())
}
