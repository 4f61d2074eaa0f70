//! Client configuration
//!
//! Precedence: env vars > config file > defaults. The credential file path
//! may be overridden with `GALLERY_CREDENTIALS_PATH` so secrets can live
//! outside the checked-in config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gallery_auth::{BASE_URL, DEFAULT_IDENTITY};
use serde::Deserialize;

use crate::pager::{DEFAULT_PAGE_SIZE, PagerConfig};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub pager: PagerSettings,
}

#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Must match the redirect URI registered for the client id
    pub redirect_uri: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsConfig {
    pub path: PathBuf,
    #[serde(default = "default_identity")]
    pub identity: String,
}

#[derive(Debug, Deserialize)]
pub struct PagerSettings {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_secs: u64,
    #[serde(default = "default_reauth_after")]
    pub reauth_after_secs: u64,
    #[serde(default = "default_mature_content")]
    pub mature_content: bool,
}

impl Default for PagerSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            initial_backoff_secs: default_initial_backoff(),
            reauth_after_secs: default_reauth_after(),
            mature_content: default_mature_content(),
        }
    }
}

fn default_base_url() -> String {
    BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_identity() -> String {
    DEFAULT_IDENTITY.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_initial_backoff() -> u64 {
    32
}

fn default_reauth_after() -> u64 {
    640
}

fn default_mature_content() -> bool {
    true
}

impl ClientConfig {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;

        if let Ok(creds) = std::env::var("GALLERY_CREDENTIALS_PATH") {
            config.credentials.path = PathBuf::from(creds);
        }

        Ok(config)
    }

    /// Parse and validate TOML contents.
    pub fn parse(contents: &str) -> common::Result<Self> {
        let config: ClientConfig = toml::from_str(contents)?;

        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }

        if config.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if config.pager.page_size == 0 {
            return Err(common::Error::Config(
                "page_size must be greater than 0".into(),
            ));
        }

        if config.pager.initial_backoff_secs == 0 {
            return Err(common::Error::Config(
                "initial_backoff_secs must be greater than 0".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve config file path from an explicit path or the CONFIG_PATH env var.
    pub fn resolve_path(explicit: Option<&str>) -> PathBuf {
        if let Some(p) = explicit {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("gallery-client.toml")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn pager_config(&self) -> PagerConfig {
        PagerConfig {
            page_size: self.pager.page_size,
            initial_backoff: Duration::from_secs(self.pager.initial_backoff_secs),
            reauth_after: Duration::from_secs(self.pager.reauth_after_secs),
            mature_content: self.pager.mature_content,
        }
    }
}
