//! Gallery operations for one authenticated identity
//!
//! Listings fail the whole run on an upstream `error` payload, while the
//! single-item lookups report it and return `None`. Detail lookups run
//! their own 429 backoff, independent of any pagination run.

use std::sync::Arc;

use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use gallery_auth::{
    API_PREFIX, AccessGuard, ApiRequest, ApiResponse, CredentialState, CredentialStore,
    ReqwestTransport,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::backoff::BackoffState;
use crate::cache::{CacheKey, ItemCache, SITE_SLUG};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{Folder, RawFolder, normalize_folder_name};
use crate::pager::{PageRequest, PagedFetcher, PagerConfig};
use crate::report::{ProgressEvent, Reporter, TracingReporter};

pub struct GalleryClient {
    guard: AccessGuard,
    cache: Arc<dyn ItemCache>,
    reporter: Arc<dyn Reporter>,
    pager: PagerConfig,
}

impl GalleryClient {
    pub fn new(
        guard: AccessGuard,
        cache: Arc<dyn ItemCache>,
        reporter: Arc<dyn Reporter>,
        pager: PagerConfig,
    ) -> Self {
        Self {
            guard,
            cache,
            reporter,
            pager,
        }
    }

    /// Build a client from configuration: load the identity's credentials
    /// and talk to the configured host over reqwest.
    pub async fn connect(config: &ClientConfig, cache: Arc<dyn ItemCache>) -> Result<Self> {
        let store = Arc::new(CredentialStore::load(config.credentials.path.clone()).await?);
        let state = CredentialState::from_store(store, &config.credentials.identity).await?;
        let transport = ReqwestTransport::with_timeout(&config.api.base_url, config.timeout())?;
        let guard = AccessGuard::new(state, Arc::new(transport), &config.api.redirect_uri);

        info!(
            identity = %config.credentials.identity,
            base_url = %config.api.base_url,
            "gallery client ready"
        );
        Ok(Self::new(
            guard,
            cache,
            Arc::new(TracingReporter),
            config.pager_config(),
        ))
    }

    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    fn fetcher(&self) -> PagedFetcher<'_> {
        PagedFetcher::new(&self.guard, self.reporter.as_ref(), &self.pager)
    }

    /// Ensure access, then stream the listing lazily.
    fn authorized_listing(&self, request: PageRequest) -> BoxStream<'_, Result<Value>> {
        let fetcher = self.fetcher();
        stream::once(async move {
            self.guard.ensure_access().await?;
            Ok::<_, Error>(fetcher.paginate(request))
        })
        .try_flatten()
        .boxed()
    }

    /// Stream the user's gallery folders.
    ///
    /// Folders with subfolders are reported and still yielded; their
    /// children are not traversed.
    pub fn list_folders(&self, username: &str) -> BoxStream<'_, Result<Folder>> {
        let request = PageRequest::get(format!("{API_PREFIX}/gallery/folders"), username)
            .with_param("username", username);
        let reporter = self.reporter.clone();

        self.authorized_listing(request)
            .and_then(move |raw| {
                let result = serde_json::from_value::<RawFolder>(raw)
                    .map_err(|e| Error::UpstreamPayload {
                        context: "gallery folders".into(),
                        description: format!("malformed folder: {e}"),
                    })
                    .map(|folder| {
                        if folder.has_subfolders {
                            reporter.report(&ProgressEvent::NestedFoldersUnsupported {
                                folder: folder.name.clone(),
                            });
                        }
                        Folder::from(folder)
                    });
                async move { result }
            })
            .boxed()
    }

    /// Stream the raw items of one folder (`"all"` lists the whole gallery).
    ///
    /// Null records are passed through untouched. Every other record is
    /// recorded in the item cache before it is yielded.
    pub fn list_folder_items(&self, username: &str, folder_id: &str) -> BoxStream<'_, Result<Value>> {
        let request = PageRequest::get(format!("{API_PREFIX}/gallery/{folder_id}"), username)
            .with_param("username", username);
        let cache = self.cache.clone();

        self.authorized_listing(request)
            .inspect_ok(move |item| record_in_cache(cache.as_ref(), item))
            .boxed()
    }

    /// First folder whose normalized name equals `slug`.
    pub async fn find_folder(&self, username: &str, slug: &str) -> Result<Option<Folder>> {
        let wanted = normalize_folder_name(slug);
        let mut folders = self.list_folders(username);
        while let Some(folder) = folders.try_next().await? {
            if folder.name == wanted {
                return Ok(Some(folder));
            }
        }
        Ok(None)
    }

    /// Original-file download URL, or `None` when the API refuses it.
    pub async fn get_download_link(&self, item_id: &str) -> Result<Option<String>> {
        let context = format!("download link for {item_id}");
        let response = self
            .authorized_get(format!("{API_PREFIX}/deviation/download/{item_id}"))
            .await?;

        if let Some(upstream) = response.upstream_error() {
            self.reporter.report(&ProgressEvent::UpstreamError {
                context,
                description: upstream.message(),
            });
            return Ok(None);
        }
        if !response.is_success() {
            return Err(Error::Transport(format!(
                "{context} returned {}",
                response.status
            )));
        }

        match response.body.get("src").and_then(Value::as_str) {
            Some(src) => Ok(Some(src.to_string())),
            None => Err(Error::UpstreamPayload {
                context,
                description: "response has no src".into(),
            }),
        }
    }

    /// Full item record, or `None` when the API reports an error for it.
    ///
    /// Throttling is retried with a backoff local to this call; access is
    /// re-checked before every attempt.
    pub async fn get_item_detail(&self, item_id: &str) -> Result<Option<Value>> {
        let context = format!("item {item_id}");
        let path = format!("{API_PREFIX}/deviation/{item_id}");
        let mut backoff = BackoffState::new(self.pager.initial_backoff, self.pager.reauth_after);

        loop {
            let response = self.authorized_get(path.clone()).await?;

            if response.is_rate_limited() {
                let wait = backoff.advance();
                self.reporter.report(&ProgressEvent::Backoff {
                    context: context.clone(),
                    wait,
                });
                tokio::time::sleep(wait).await;
                continue;
            }
            if backoff.is_throttled() {
                self.reporter.report(&ProgressEvent::ThrottleRecovered {
                    context: context.clone(),
                });
            }

            if let Some(upstream) = response.upstream_error() {
                self.reporter.report(&ProgressEvent::UpstreamError {
                    context,
                    description: upstream.message(),
                });
                return Ok(None);
            }
            if !response.is_success() {
                return Err(Error::Transport(format!(
                    "{context} returned {}",
                    response.status
                )));
            }
            return Ok(Some(response.body));
        }
    }

    /// Best URL for an item's image.
    ///
    /// The preview (`content.src`) is used when the item is not downloadable
    /// or the download is the same size as the preview; otherwise the
    /// original file's download link is fetched.
    pub async fn resolve_source(&self, item: &Value) -> Result<Option<String>> {
        let content_src = item
            .pointer("/content/src")
            .and_then(Value::as_str)
            .map(String::from);
        let downloadable = item
            .get("is_downloadable")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let download_size = item.get("download_filesize").and_then(Value::as_u64);
        let content_size = item.pointer("/content/filesize").and_then(Value::as_u64);

        if !downloadable || (download_size.is_some() && download_size == content_size) {
            return Ok(content_src);
        }

        let item_id = item
            .get("deviationid")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::UpstreamPayload {
                context: "source resolution".into(),
                description: "downloadable item has no deviationid".into(),
            })?;
        self.get_download_link(item_id).await
    }

    async fn authorized_get(&self, path: String) -> Result<ApiResponse> {
        self.guard.ensure_access().await?;
        let request = ApiRequest::get(path).with_authorization(self.guard.auth_header().await?);
        Ok(self.guard.transport().send(request).await?)
    }
}

fn record_in_cache(cache: &dyn ItemCache, item: &Value) {
    if item.is_null() {
        return;
    }
    let author = item.pointer("/author/username").and_then(Value::as_str);
    let url = item.get("url").and_then(Value::as_str);
    let id = item.get("deviationid").and_then(Value::as_str);
    match (author, url, id) {
        (Some(author), Some(url), Some(id)) => {
            cache.record(CacheKey::new(SITE_SLUG, author, url), id)
        }
        _ => debug!("listing record lacks author, url or id, not cached"),
    }
}
