//! Gallery API client
//!
//! Streams folders and artwork listings for one authenticated identity
//! through cursor pagination, absorbing HTTP 429 throttling with
//! exponential backoff and re-validating credentials around it.
//!
//! Every operation on `GalleryClient` first runs
//! `AccessGuard::ensure_access`, so callers never deal with tokens:
//! 1. `ClientConfig::load()` reads the TOML config
//! 2. `GalleryClient::connect()` loads the identity's credentials
//! 3. `list_folders()` / `list_folder_items()` stream records lazily
//! 4. `get_download_link()` / `get_item_detail()` fetch single items
//! 5. `Downloader::download()` saves linked galleries, folders and arts

pub mod api;
pub mod backoff;
pub mod cache;
pub mod config;
pub mod download;
pub mod error;
pub mod links;
pub mod models;
pub mod pager;
pub mod report;

#[cfg(test)]
mod test_support;

pub use api::GalleryClient;
pub use backoff::BackoffState;
pub use cache::{CacheKey, ItemCache, MemoryCache, SITE_SLUG};
pub use config::ClientConfig;
pub use download::{DownloadSummary, Downloader, HttpImageFetcher, ImageFetcher, SaveOutcome};
pub use error::{Error, Result};
pub use links::{GalleryLink, parse_link};
pub use models::{Folder, RawFolder};
pub use pager::{PageRequest, PagedFetcher, PagerConfig, PaginationCursor};
pub use report::{CollectingReporter, ProgressEvent, Reporter, TracingReporter};
