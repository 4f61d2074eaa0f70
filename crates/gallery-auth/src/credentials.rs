//! Credential storage
//!
//! A JSON file mapping identity slug to client registration plus OAuth
//! material:
//!
//! ```json
//! { "deviantart": { "client_id": "...", "client_secret": "...",
//!                   "oauth": { "code": "...", "access_token": "...", "refresh_token": "..." } } }
//! ```
//!
//! Writes go through a temp file + rename so a crash never leaves a torn file.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// OAuth material for one identity. Absent values are omitted from the file.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthMaterial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for OAuthMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthMaterial")
            .field("code", &self.code.as_ref().map(|_| "[REDACTED]"))
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Client registration and OAuth material for one identity.
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub oauth: OAuthMaterial,
}

impl fmt::Debug for IdentityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityRecord")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("oauth", &self.oauth)
            .finish()
    }
}

/// Sink for OAuth material after a successful token exchange.
pub trait CredentialPersistence: Send + Sync {
    fn persist<'a>(
        &'a self,
        identity: &'a str,
        oauth: &'a OAuthMaterial,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// File-backed credential store.
pub struct CredentialStore {
    path: PathBuf,
    state: Mutex<HashMap<String, IdentityRecord>>,
}

impl CredentialStore {
    /// Load credentials from `path`, creating an empty `{}` file if missing.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
            let records: HashMap<String, IdentityRecord> = serde_json::from_str(&contents)
                .map_err(|e| Error::CredentialParse(format!("parsing credential file: {e}")))?;
            info!(path = %path.display(), identities = records.len(), "loaded credentials");
            records
        } else {
            info!(path = %path.display(), "credential file not found, starting with empty store");
            let records = HashMap::new();
            write_atomic(&path, &records).await?;
            records
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, identity: &str) -> Option<IdentityRecord> {
        let state = self.state.lock().await;
        state.get(identity).cloned()
    }

    /// Stored identity names, sorted.
    pub async fn identities(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut names: Vec<String> = state.keys().cloned().collect();
        names.sort();
        names
    }

    /// Add or replace an identity and persist to disk.
    pub async fn add(&self, identity: String, record: IdentityRecord) -> Result<()> {
        let mut state = self.state.lock().await;
        state.insert(identity.clone(), record);
        debug!(identity, "added identity");
        write_atomic(&self.path, &state).await
    }

    /// Replace the OAuth block of an existing identity and persist to disk.
    pub async fn update_oauth(&self, identity: &str, oauth: OAuthMaterial) -> Result<()> {
        let mut state = self.state.lock().await;
        let record = state
            .get_mut(identity)
            .ok_or_else(|| Error::NotFound(format!("identity {identity} not in credential store")))?;
        record.oauth = oauth;
        debug!(identity, "updated oauth material");
        write_atomic(&self.path, &state).await
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl CredentialPersistence for CredentialStore {
    fn persist<'a>(
        &'a self,
        identity: &'a str,
        oauth: &'a OAuthMaterial,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.update_oauth(identity, oauth.clone()))
    }
}

/// Write the store to `path` via temp file + rename, mode 0600 on unix.
async fn write_atomic(path: &Path, data: &HashMap<String, IdentityRecord>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::CredentialParse(format!("serializing credentials: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;
    let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credentials");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_code() -> IdentityRecord {
        IdentityRecord {
            client_id: "1234".into(),
            client_secret: "s3cret".into(),
            oauth: OAuthMaterial {
                code: Some("code_1".into()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn parses_nested_identity_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        tokio::fs::write(
            &path,
            r#"{"deviantart":{"client_id":"1","client_secret":"2","oauth":{"access_token":"at","refresh_token":"rt"}}}"#,
        )
        .await
        .unwrap();

        let store = CredentialStore::load(path).await.unwrap();
        let record = store.get("deviantart").await.unwrap();
        assert_eq!(record.client_id, "1");
        assert_eq!(record.oauth.code, None);
        assert_eq!(record.oauth.access_token.as_deref(), Some("at"));
        assert_eq!(record.oauth.refresh_token.as_deref(), Some("rt"));
    }

    #[tokio::test]
    async fn missing_oauth_block_defaults_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        tokio::fs::write(&path, r#"{"deviantart":{"client_id":"1","client_secret":"2"}}"#)
            .await
            .unwrap();

        let store = CredentialStore::load(path).await.unwrap();
        assert_eq!(store.get("deviantart").await.unwrap().oauth, OAuthMaterial::default());
    }

    #[tokio::test]
    async fn cold_start_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");

        let store = CredentialStore::load(path.clone()).await.unwrap();
        assert!(store.is_empty().await);
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: HashMap<String, IdentityRecord> = serde_json::from_str(&contents).unwrap();
        assert!(parsed.is_empty());
    }

    #[tokio::test]
    async fn update_oauth_drops_cleared_code_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        let store = CredentialStore::load(path.clone()).await.unwrap();
        store.add("deviantart".into(), record_with_code()).await.unwrap();

        store
            .update_oauth(
                "deviantart",
                OAuthMaterial {
                    code: None,
                    access_token: Some("at_new".into()),
                    refresh_token: Some("rt_new".into()),
                },
            )
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(!contents.contains("\"code\""), "code must not be persisted: {contents}");
        let reloaded = CredentialStore::load(path).await.unwrap();
        let record = reloaded.get("deviantart").await.unwrap();
        assert_eq!(record.oauth.access_token.as_deref(), Some("at_new"));
        assert_eq!(record.client_secret, "s3cret");
    }

    #[tokio::test]
    async fn update_unknown_identity_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::load(dir.path().join("creds.json")).await.unwrap();
        let result = store.update_oauth("nobody", OAuthMaterial::default()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let result = CredentialStore::load(path).await;
        assert!(matches!(result, Err(Error::CredentialParse(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        let store = CredentialStore::load(path.clone()).await.unwrap();
        store.add("deviantart".into(), record_with_code()).await.unwrap();

        let mode = tokio::fs::metadata(&path).await.unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "credential file must be 0600, got {mode:o}");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let debug = format!("{:?}", record_with_code());
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("code_1"));
        assert!(debug.contains("1234"));
    }
}
