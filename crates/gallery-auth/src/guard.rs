//! Access validation before authenticated calls
//!
//! `AccessGuard::ensure_access` is called ahead of every authenticated
//! request. Without a refresh token it performs the first code exchange;
//! otherwise it probes the current access token and refreshes only when the
//! probe does not report success. At most one exchange happens per call.

use std::sync::Arc;

use common::Secret;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::constants::PLACEBO_PATH;
use crate::error::Result;
use crate::state::CredentialState;
use crate::token::{self, GrantKind};
use crate::transport::{ApiRequest, HttpTransport};

/// Owns the credential state for one identity and the transport used to
/// validate and renew it.
///
/// The state sits behind a tokio `Mutex` held for the whole check, so two
/// calls on the same guard never exchange tokens concurrently. Separate
/// guards for the same identity are not coordinated.
pub struct AccessGuard {
    identity: String,
    state: Mutex<CredentialState>,
    transport: Arc<dyn HttpTransport>,
    redirect_uri: String,
}

impl AccessGuard {
    pub fn new(
        state: CredentialState,
        transport: Arc<dyn HttpTransport>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            identity: state.identity().to_string(),
            state: Mutex::new(state),
            transport,
            redirect_uri: redirect_uri.into(),
        }
    }

    pub fn transport(&self) -> &dyn HttpTransport {
        self.transport.as_ref()
    }

    /// Credential store key this guard authenticates as.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Current `Authorization` header value.
    pub async fn auth_header(&self) -> Result<Secret<String>> {
        self.state.lock().await.auth_header()
    }

    /// Run `f` against the current credential state.
    pub async fn inspect<R>(&self, f: impl FnOnce(&CredentialState) -> R) -> R {
        let state = self.state.lock().await;
        f(&state)
    }

    pub async fn ensure_access(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        if !state.has_refresh_token() {
            debug!(identity = state.identity(), "no refresh token, exchanging authorization code");
            return token::exchange(
                self.transport.as_ref(),
                GrantKind::AuthorizationCode,
                &mut state,
                &self.redirect_uri,
            )
            .await;
        }

        if self.probe(&state).await? {
            debug!(identity = state.identity(), "access token valid");
            return Ok(());
        }

        info!(identity = state.identity(), "access token rejected, refreshing");
        token::exchange(
            self.transport.as_ref(),
            GrantKind::RefreshToken,
            &mut state,
            &self.redirect_uri,
        )
        .await
    }

    /// Ask the placebo endpoint whether the access token still works.
    async fn probe(&self, state: &CredentialState) -> Result<bool> {
        let Some(access_token) = state.access_token() else {
            return Ok(false);
        };
        let request = ApiRequest::post(PLACEBO_PATH).with_query("access_token", access_token);
        let response = self.transport.send(request).await?;
        Ok(response.body.get("status").and_then(Value::as_str) == Some("success"))
    }
}
