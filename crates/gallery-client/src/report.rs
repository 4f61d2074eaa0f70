//! Progress diagnostics
//!
//! The client describes what it is doing through `ProgressEvent`s handed to
//! a `Reporter`. Rendering them for a human is the reporter's business; the
//! default one turns them into tracing events.

use std::sync::Mutex;
use std::time::Duration;

use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// First 429 of a pagination run.
    RateLimited { subject: String, offset: u64 },
    /// About to sleep before retrying a throttled request.
    Backoff { context: String, wait: Duration },
    /// A response arrived unthrottled after a throttling episode.
    ThrottleRecovered { context: String },
    /// A folder has subfolders, which are not traversed.
    NestedFoldersUnsupported { folder: String },
    /// A single-item lookup failed upstream; the caller gets no value.
    UpstreamError { context: String, description: String },
    /// A pagination run hit an upstream error and is about to fail.
    PaginationFailed { context: String, description: String },
    /// The target file already exists; nothing was fetched.
    Skipped { name: String },
    /// An image was written to disk.
    Downloaded { name: String, bytes: u64 },
    /// Requested artworks that never showed up in the artist's gallery.
    ArtsNotFound { artist: String, count: usize },
    /// A requested folder slug matched none of the artist's folders.
    FolderNotFound { artist: String, folder: String },
    /// A link that names no gallery, folder or artwork.
    UnsupportedLink { url: String },
}

pub trait Reporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Emits every event as a structured tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::RateLimited { subject, offset } => {
                warn!(subject = %subject, offset, "rate limited in pager")
            }
            ProgressEvent::Backoff { context, wait } => {
                info!(context = %context, wait_secs = wait.as_secs(), "retrying after backoff")
            }
            ProgressEvent::ThrottleRecovered { context } => {
                info!(context = %context, "rate limit cleared")
            }
            ProgressEvent::NestedFoldersUnsupported { folder } => {
                warn!(folder = %folder, "folder has subfolders, nested traversal is not supported")
            }
            ProgressEvent::UpstreamError {
                context,
                description,
            } => warn!(context = %context, error = %description, "upstream lookup failed"),
            ProgressEvent::PaginationFailed {
                context,
                description,
            } => warn!(context = %context, error = %description, "pagination aborted by upstream error"),
            ProgressEvent::Skipped { name } => info!(name = %name, "skip existing"),
            ProgressEvent::Downloaded { name, bytes } => info!(name = %name, bytes, "downloaded"),
            ProgressEvent::ArtsNotFound { artist, count } => {
                warn!(artist = %artist, count, "requested arts not found in gallery")
            }
            ProgressEvent::FolderNotFound { artist, folder } => {
                warn!(artist = %artist, folder = %folder, "requested folder not found")
            }
            ProgressEvent::UnsupportedLink { url } => warn!(url = %url, "unsupported link"),
        }
    }
}

/// Keeps events in memory, for callers that render them later.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingReporter {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Waits of every `Backoff` event, in order.
    pub fn backoff_waits(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Backoff { wait, .. } => Some(wait),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, event: &ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}
