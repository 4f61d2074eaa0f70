//! In-memory credential state for one identity
//!
//! Tokens only change through `apply_exchange_result`, which replaces both
//! tokens together, drops the used authorization code and persists the
//! result before returning.

use std::fmt;
use std::sync::Arc;

use common::Secret;
use tracing::debug;

use crate::credentials::{CredentialPersistence, CredentialStore, IdentityRecord, OAuthMaterial};
use crate::error::{Error, Result};

pub struct CredentialState {
    identity: String,
    client_id: String,
    client_secret: Secret<String>,
    authorization_code: Option<Secret<String>>,
    access_token: Option<Secret<String>>,
    refresh_token: Option<Secret<String>>,
    persistence: Arc<dyn CredentialPersistence>,
}

impl CredentialState {
    pub fn new(
        identity: impl Into<String>,
        record: IdentityRecord,
        persistence: Arc<dyn CredentialPersistence>,
    ) -> Self {
        let IdentityRecord {
            client_id,
            client_secret,
            oauth,
        } = record;
        Self {
            identity: identity.into(),
            client_id,
            client_secret: Secret::new(client_secret),
            authorization_code: oauth.code.map(Secret::new),
            access_token: oauth.access_token.map(Secret::new),
            refresh_token: oauth.refresh_token.map(Secret::new),
            persistence,
        }
    }

    /// Build the state for `identity` from a loaded store, persisting back into it.
    pub async fn from_store(store: Arc<CredentialStore>, identity: &str) -> Result<Self> {
        let Some(record) = store.get(identity).await else {
            return Err(Error::NotFound(format!(
                "identity {identity} not in credential store {} (known: [{}])",
                store.path().display(),
                store.identities().await.join(", ")
            )));
        };
        Ok(Self::new(identity, record, store))
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        self.client_secret.expose()
    }

    pub fn authorization_code(&self) -> Option<&str> {
        self.authorization_code.as_ref().map(|s| s.expose().as_str())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(|s| s.expose().as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|s| s.expose().as_str())
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// `Authorization` header value for API calls.
    pub fn auth_header(&self) -> Result<Secret<String>> {
        let token = self.access_token().ok_or(Error::MissingAccessToken)?;
        Ok(Secret::new(format!("Bearer {token}")))
    }

    /// Install a freshly exchanged token pair and persist it.
    ///
    /// The in-memory state is updated before persisting, so a failed write
    /// still leaves the process with working tokens; the write error is
    /// returned to the caller.
    pub async fn apply_exchange_result(
        &mut self,
        access_token: String,
        refresh_token: String,
    ) -> Result<()> {
        let oauth = OAuthMaterial {
            code: None,
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
        };
        self.authorization_code = None;
        self.access_token = oauth.access_token.clone().map(Secret::new);
        self.refresh_token = oauth.refresh_token.clone().map(Secret::new);
        debug!(identity = %self.identity, "token pair replaced");

        self.persistence.persist(&self.identity, &oauth).await
    }
}

impl fmt::Debug for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialState")
            .field("identity", &self.identity)
            .field("client_id", &self.client_id)
            .field("has_code", &self.authorization_code.is_some())
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}
