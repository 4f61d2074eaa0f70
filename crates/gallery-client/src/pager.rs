//! Cursor-paginated, rate-limit-aware listing fetcher
//!
//! A run starts at offset 0 and follows the server's `next_offset` until a
//! page reports `has_more: false`. Items are yielded one at a time and the
//! next page is only requested once the current one has been drained.
//!
//! Per request:
//! - 429: report the first throttle of the run, re-validate credentials once
//!   the pending wait passes the re-auth threshold, sleep, double the wait,
//!   retry the same offset
//! - first response after a throttle: reset the wait, re-validate credentials
//! - `error` payload: fatal for the run
//! - other non-2xx: transport error

use std::collections::VecDeque;
use std::time::Duration;

use futures_util::stream::{self, BoxStream, StreamExt};
use gallery_auth::{AccessGuard, ApiRequest, Method};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::backoff::{BackoffState, DEFAULT_INITIAL_WAIT, DEFAULT_REAUTH_AFTER};
use crate::error::{Error, Result};
use crate::report::{ProgressEvent, Reporter};

/// Largest page the gallery endpoints accept.
pub const DEFAULT_PAGE_SIZE: u32 = 24;

#[derive(Debug, Clone)]
pub struct PagerConfig {
    pub page_size: u32,
    pub initial_backoff: Duration,
    pub reauth_after: Duration,
    pub mature_content: bool,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            initial_backoff: DEFAULT_INITIAL_WAIT,
            reauth_after: DEFAULT_REAUTH_AFTER,
            mature_content: true,
        }
    }
}

/// A listing endpoint plus the parameters sent with every page.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    /// Who the listing is about, for diagnostics (usually the username).
    pub subject: String,
}

impl PageRequest {
    pub fn get(path: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            params: Vec::new(),
            subject: subject.into(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// Position within one pagination run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    pub offset: u64,
    pub limit: u32,
    pub has_more: bool,
}

impl PaginationCursor {
    pub fn new(limit: u32) -> Self {
        Self {
            offset: 0,
            limit,
            has_more: true,
        }
    }

    /// Adopt the server's cursor. While more pages remain the offset must
    /// strictly increase, otherwise the run would refetch the same page forever.
    pub fn advance(&mut self, has_more: bool, next_offset: Option<u64>) -> std::result::Result<(), String> {
        self.has_more = has_more;
        if !has_more {
            return Ok(());
        }
        let next = next_offset.ok_or("page has more results but no next_offset")?;
        if next <= self.offset {
            return Err(format!(
                "next_offset {next} does not advance past offset {}",
                self.offset
            ));
        }
        self.offset = next;
        Ok(())
    }
}

#[derive(Deserialize)]
struct Page {
    results: Vec<Value>,
    has_more: bool,
    #[serde(default)]
    next_offset: Option<u64>,
}

/// Streams listing pages on behalf of one authenticated identity.
#[derive(Clone, Copy)]
pub struct PagedFetcher<'a> {
    guard: &'a AccessGuard,
    reporter: &'a dyn Reporter,
    config: &'a PagerConfig,
}

impl<'a> PagedFetcher<'a> {
    pub fn new(guard: &'a AccessGuard, reporter: &'a dyn Reporter, config: &'a PagerConfig) -> Self {
        Self {
            guard,
            reporter,
            config,
        }
    }

    /// Lazily yield every raw record of the listing, in server order.
    ///
    /// The stream ends after the first page with `has_more: false`, or right
    /// after yielding an error. It cannot be resumed; start a new run instead.
    pub fn paginate(self, request: PageRequest) -> BoxStream<'a, Result<Value>> {
        let run = Run {
            fetcher: self,
            cursor: PaginationCursor::new(self.config.page_size),
            backoff: BackoffState::new(self.config.initial_backoff, self.config.reauth_after),
            buffer: VecDeque::new(),
            request,
        };

        stream::try_unfold(run, Run::next_item).boxed()
    }
}

struct Run<'a> {
    fetcher: PagedFetcher<'a>,
    request: PageRequest,
    cursor: PaginationCursor,
    backoff: BackoffState,
    buffer: VecDeque<Value>,
}

impl<'a> Run<'a> {
    async fn next_item(mut self) -> Result<Option<(Value, Run<'a>)>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some((item, self)));
            }
            if !self.cursor.has_more {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    fn build_request(&self) -> ApiRequest {
        let mut request = ApiRequest::new(self.request.method, self.request.path.clone());
        for (key, value) in &self.request.params {
            request.set_query(key.clone(), value.clone());
        }
        request.set_query("offset", self.cursor.offset.to_string());
        request.set_query("limit", self.cursor.limit.to_string());
        request.set_query("mature_content", self.fetcher.config.mature_content.to_string());
        request
    }

    /// Fetch the page at the current offset into the buffer, retrying
    /// through any number of 429s.
    async fn fetch_page(&mut self) -> Result<()> {
        let guard = self.fetcher.guard;
        let reporter = self.fetcher.reporter;
        let path = self.request.path.clone();

        loop {
            let request = self.build_request().with_authorization(guard.auth_header().await?);
            let response = guard.transport().send(request).await?;

            if response.is_rate_limited() {
                if !self.backoff.is_throttled() {
                    reporter.report(&ProgressEvent::RateLimited {
                        subject: self.request.subject.clone(),
                        offset: self.cursor.offset,
                    });
                } else if self.backoff.needs_reauth() {
                    debug!(path = %path, "sustained rate limiting, re-validating credentials");
                    guard.ensure_access().await?;
                }
                let wait = self.backoff.advance();
                reporter.report(&ProgressEvent::Backoff {
                    context: path.clone(),
                    wait,
                });
                tokio::time::sleep(wait).await;
                continue;
            }

            if self.backoff.is_throttled() {
                self.backoff.reset();
                reporter.report(&ProgressEvent::ThrottleRecovered {
                    context: path.clone(),
                });
                guard.ensure_access().await?;
            }

            if let Some(upstream) = response.upstream_error() {
                let description = upstream.message();
                reporter.report(&ProgressEvent::PaginationFailed {
                    context: path.clone(),
                    description: description.clone(),
                });
                return Err(Error::UpstreamPayload {
                    context: path,
                    description,
                });
            }

            if !response.is_success() {
                return Err(Error::Transport(format!(
                    "{path} returned {} at offset {}",
                    response.status, self.cursor.offset
                )));
            }

            let page: Page =
                serde_json::from_value(response.body).map_err(|e| Error::UpstreamPayload {
                    context: path.clone(),
                    description: format!("malformed page: {e}"),
                })?;
            debug!(
                path = %path,
                offset = self.cursor.offset,
                items = page.results.len(),
                has_more = page.has_more,
                "fetched page"
            );
            self.buffer.extend(page.results);
            return self
                .cursor
                .advance(page.has_more, page.next_offset)
                .map_err(|description| Error::UpstreamPayload {
                    context: path,
                    description,
                });
        }
    }
}
