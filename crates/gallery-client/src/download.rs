//! Saving gallery images to disk
//!
//! Files are named `<name><ext>`: `name` is the last segment of the item's
//! page URL, `ext` comes from the image URL's path. A file that already
//! exists is never fetched again, so an interrupted run can simply be
//! repeated.
//!
//! Links passed to `Downloader::download` are grouped per artist first:
//! - whole galleries are streamed from the `all` listing
//! - folders are matched by slug against the artist's folder list
//! - single artworks are looked up in the `all` listing, which stops as soon
//!   as every requested artwork was seen

use std::future::Future;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use futures_util::{StreamExt, TryStreamExt};
use reqwest::Url;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::api::GalleryClient;
use crate::error::{Error, Result};
use crate::links::{GalleryLink, parse_link};
use crate::report::ProgressEvent;

/// Fetches image bytes into a local file.
pub trait ImageFetcher: Send + Sync {
    /// Download `url` into `dest`, returning the number of bytes written.
    /// `dest` only appears once the body was written completely.
    fn fetch_to<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<u64>> + Send + 'a>>;
}

/// Streams image bodies over `reqwest` into a hidden `.part` file, then
/// renames it into place.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("building HTTP client: {e}")))?;
        Ok(Self::new(client))
    }

    async fn write_body(&self, url: &str, partial: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("GET {url} failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "GET {url} returned {}",
                status.as_u16()
            )));
        }

        let mut file = tokio::fs::File::create(partial)
            .await
            .map_err(|e| io_error(partial, e))?;
        let mut body = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| Error::Transport(format!("reading {url}: {e}")))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| io_error(partial, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| io_error(partial, e))?;
        Ok(written)
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch_to<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<u64>> + Send + 'a>> {
        Box::pin(async move {
            let partial = partial_path(dest);
            match self.write_body(url, &partial).await {
                Ok(written) => {
                    tokio::fs::rename(&partial, dest)
                        .await
                        .map_err(|e| io_error(dest, e))?;
                    Ok(written)
                }
                Err(err) => {
                    // may not exist if the request itself failed
                    let _ = tokio::fs::remove_file(&partial).await;
                    Err(err)
                }
            }
        })
    }
}

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Downloaded,
    Skipped,
}

/// Counts for one download call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
    /// Requested artworks or folders that were never found.
    pub missing: usize,
}

impl DownloadSummary {
    fn record(&mut self, outcome: Option<SaveOutcome>) {
        match outcome {
            Some(SaveOutcome::Downloaded) => self.downloaded += 1,
            Some(SaveOutcome::Skipped) => self.skipped += 1,
            None => {}
        }
    }
}

impl AddAssign for DownloadSummary {
    fn add_assign(&mut self, other: Self) {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.missing += other.missing;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct WantedArt {
    name: String,
    url: String,
}

/// Requested links grouped by kind and artist, in first-seen order.
#[derive(Debug, Default)]
struct DownloadPlan {
    all: Vec<String>,
    folders: Vec<(String, Vec<String>)>,
    arts: Vec<(String, Vec<WantedArt>)>,
}

fn group<'v, T: Default>(groups: &'v mut Vec<(String, T)>, artist: &str) -> &'v mut T {
    let index = match groups.iter().position(|(a, _)| a == artist) {
        Some(index) => index,
        None => {
            groups.push((artist.to_string(), T::default()));
            groups.len() - 1
        }
    };
    &mut groups[index].1
}

/// Saves gallery images through a `GalleryClient`.
pub struct Downloader {
    client: GalleryClient,
    images: Box<dyn ImageFetcher>,
}

impl Downloader {
    pub fn new(client: GalleryClient, images: Box<dyn ImageFetcher>) -> Self {
        Self { client, images }
    }

    pub fn client(&self) -> &GalleryClient {
        &self.client
    }

    /// Save `url` as `<folder>/<name><ext>` unless that file exists.
    pub async fn save_from_url(&self, url: &str, folder: &Path, name: &str) -> Result<SaveOutcome> {
        let path = folder.join(format!("{name}{}", file_extension(url)));
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| io_error(&path, e))?;
        if exists {
            self.client.reporter().report(&ProgressEvent::Skipped {
                name: name.to_string(),
            });
            return Ok(SaveOutcome::Skipped);
        }

        let bytes = self.images.fetch_to(url, &path).await?;
        self.client.reporter().report(&ProgressEvent::Downloaded {
            name: name.to_string(),
            bytes,
        });
        Ok(SaveOutcome::Downloaded)
    }

    /// Save an item's best image. `None` when no source could be resolved.
    pub async fn save_item(&self, item: &Value, folder: &Path, name: &str) -> Result<Option<SaveOutcome>> {
        match self.client.resolve_source(item).await? {
            Some(src) => self.save_from_url(&src, folder, name).await.map(Some),
            None => {
                debug!(name, "no image source, nothing saved");
                Ok(None)
            }
        }
    }

    /// Save every item of one folder into `save_folder`.
    pub async fn download_folder(
        &self,
        username: &str,
        folder_id: &str,
        save_folder: &Path,
    ) -> Result<DownloadSummary> {
        let mut summary = DownloadSummary::default();
        let mut items = self.client.list_folder_items(username, folder_id);
        while let Some(item) = items.try_next().await? {
            let Some(name) = item.get("url").and_then(Value::as_str).and_then(item_name) else {
                continue;
            };
            let outcome = self.save_item(&item, save_folder, name).await?;
            summary.record(outcome);
        }
        Ok(summary)
    }

    /// Download everything the gallery links point at into
    /// `<data_dir>/<artist>/`.
    pub async fn download<I, S>(&self, urls: I, data_dir: &Path) -> Result<DownloadSummary>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        info!(dir = %data_dir.display(), "saving gallery images");
        let mut summary = DownloadSummary::default();
        let plan = self.plan(urls, data_dir, &mut summary).await?;

        for artist in &plan.all {
            let save_folder = artist_dir(data_dir, artist).await?;
            info!(artist = %artist, "downloading whole gallery");
            summary += self.download_folder(artist, "all", &save_folder).await?;
        }

        for (artist, wanted) in &plan.folders {
            let save_folder = artist_dir(data_dir, artist).await?;
            summary += self.download_folders(artist, wanted, &save_folder).await?;
        }

        for (artist, wanted) in &plan.arts {
            let save_folder = artist_dir(data_dir, artist).await?;
            summary += self.download_arts(artist, wanted, &save_folder).await?;
        }

        Ok(summary)
    }

    async fn plan<I, S>(
        &self,
        urls: I,
        data_dir: &Path,
        summary: &mut DownloadSummary,
    ) -> Result<DownloadPlan>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut plan = DownloadPlan::default();
        for url in urls {
            let url = url.as_ref();
            match parse_link(url) {
                Some(GalleryLink::All { artist }) => {
                    if !plan.all.contains(&artist) {
                        plan.all.push(artist);
                    }
                }
                Some(GalleryLink::Folder { artist, folder }) => {
                    let folders = group(&mut plan.folders, &artist);
                    if !folders.contains(&folder) {
                        folders.push(folder);
                    }
                }
                Some(GalleryLink::Art { artist, name, url }) => {
                    if stem_exists(&data_dir.join(&artist), &name).await? {
                        self.client.reporter().report(&ProgressEvent::Skipped {
                            name: format!("{artist}/{name}"),
                        });
                        summary.skipped += 1;
                        continue;
                    }
                    let arts = group(&mut plan.arts, &artist);
                    if !arts.iter().any(|a| a.url == url) {
                        arts.push(WantedArt { name, url });
                    }
                }
                Some(GalleryLink::Unknown { .. }) | None => {
                    self.client.reporter().report(&ProgressEvent::UnsupportedLink {
                        url: url.to_string(),
                    });
                }
            }
        }
        Ok(plan)
    }

    async fn download_folders(
        &self,
        artist: &str,
        wanted: &[String],
        save_folder: &Path,
    ) -> Result<DownloadSummary> {
        let mut summary = DownloadSummary::default();
        let mut matched: Vec<&str> = Vec::new();

        let mut folders = self.client.list_folders(artist);
        while let Some(folder) = folders.try_next().await? {
            if !wanted.contains(&folder.name) {
                continue;
            }
            info!(artist = %artist, gallery = %folder.pretty_name, "downloading folder");
            summary += self.download_folder(artist, &folder.id, save_folder).await?;
            if let Some(slug) = wanted.iter().find(|w| **w == folder.name) {
                matched.push(slug);
            }
        }

        for folder in wanted.iter().filter(|w| !matched.contains(&w.as_str())) {
            self.client.reporter().report(&ProgressEvent::FolderNotFound {
                artist: artist.to_string(),
                folder: folder.clone(),
            });
            summary.missing += 1;
        }
        Ok(summary)
    }

    async fn download_arts(
        &self,
        artist: &str,
        wanted: &[WantedArt],
        save_folder: &Path,
    ) -> Result<DownloadSummary> {
        let mut summary = DownloadSummary::default();
        let mut remaining = wanted.to_vec();

        let mut items = self.client.list_folder_items(artist, "all");
        while !remaining.is_empty() {
            let Some(item) = items.try_next().await? else {
                break;
            };
            let Some(url) = item.get("url").and_then(Value::as_str) else {
                continue;
            };
            let Some(position) = remaining.iter().position(|a| a.url == url) else {
                continue;
            };
            let art = remaining.remove(position);
            let name = item_name(url).unwrap_or(art.name.as_str());
            let outcome = self.save_item(&item, save_folder, name).await?;
            summary.record(outcome);
        }

        if !remaining.is_empty() {
            self.client.reporter().report(&ProgressEvent::ArtsNotFound {
                artist: artist.to_string(),
                count: remaining.len(),
            });
            summary.missing += remaining.len();
        }
        Ok(summary)
    }
}

/// Extension of the URL path's last segment, with its dot, or empty.
pub fn file_extension(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };
    Path::new(&path)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Last path segment of an item page URL, used as the file stem.
pub fn item_name(url: &str) -> Option<&str> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
}

/// Whether `folder` holds any `<name>.*` file.
async fn stem_exists(folder: &Path, name: &str) -> Result<bool> {
    let mut entries = match tokio::fs::read_dir(folder).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(io_error(folder, e)),
    };
    let prefix = format!("{name}.");
    while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(folder, e))? {
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            return Ok(true);
        }
    }
    Ok(false)
}

async fn artist_dir(data_dir: &Path, artist: &str) -> Result<PathBuf> {
    let dir = data_dir.join(artist);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| io_error(&dir, e))?;
    Ok(dir)
}

fn partial_path(dest: &Path) -> PathBuf {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{file_name}.part"))
}

fn io_error(path: &Path, err: std::io::Error) -> Error {
    Error::Io(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::pager::PagerConfig;
    use crate::report::CollectingReporter;
    use crate::test_support::authorized_guard;
    use axum::http::StatusCode;
    use axum::routing::get;
    use gallery_auth::testing::ScriptedTransport;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    const ALL: &str = "/api/v1/oauth2/gallery/all";
    const FOLDERS: &str = "/api/v1/oauth2/gallery/folders";

    /// Serves image bytes from memory and remembers what was asked for.
    #[derive(Default)]
    struct MemoryImages {
        files: HashMap<String, Vec<u8>>,
        fetched: Arc<Mutex<Vec<String>>>,
    }

    impl MemoryImages {
        fn with(mut self, url: &str, bytes: &[u8]) -> Self {
            self.files.insert(url.to_string(), bytes.to_vec());
            self
        }
    }

    impl ImageFetcher for MemoryImages {
        fn fetch_to<'a>(
            &'a self,
            url: &'a str,
            dest: &'a Path,
        ) -> Pin<Box<dyn Future<Output = Result<u64>> + Send + 'a>> {
            Box::pin(async move {
                self.fetched.lock().unwrap().push(url.to_string());
                let bytes = self
                    .files
                    .get(url)
                    .ok_or_else(|| Error::Transport(format!("GET {url} returned 404")))?;
                tokio::fs::write(dest, bytes).await.unwrap();
                Ok(bytes.len() as u64)
            })
        }
    }

    struct Fixture {
        downloader: Downloader,
        transport: Arc<ScriptedTransport>,
        reporter: Arc<CollectingReporter>,
        fetched: Arc<Mutex<Vec<String>>>,
        dir: tempfile::TempDir,
    }

    fn fixture(images: MemoryImages) -> Fixture {
        let transport = Arc::new(ScriptedTransport::new());
        let reporter = Arc::new(CollectingReporter::default());
        let client = GalleryClient::new(
            authorized_guard(transport.clone()),
            Arc::new(MemoryCache::default()),
            reporter.clone(),
            PagerConfig::default(),
        );
        let fetched = images.fetched.clone();
        Fixture {
            downloader: Downloader::new(client, Box::new(images)),
            transport,
            reporter,
            fetched,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn art(artist: &str, name: &str, src: &str) -> Value {
        json!({
            "deviationid": format!("id-{name}"),
            "url": format!("https://www.deviantart.com/{artist}/art/{name}"),
            "author": {"username": artist},
            "is_downloadable": false,
            "content": {"src": src, "filesize": 3},
        })
    }

    fn art_link(artist: &str, name: &str) -> String {
        format!("https://www.deviantart.com/{artist}/art/{name}")
    }

    fn listing(results: Vec<Value>, next_offset: Option<u64>) -> Value {
        json!({
            "results": results,
            "has_more": next_offset.is_some(),
            "next_offset": next_offset,
        })
    }

    #[test]
    fn extension_comes_from_url_path() {
        assert_eq!(file_extension("https://images.example/a/b/pic.jpg?token=x.y"), ".jpg");
        assert_eq!(file_extension("https://images.example/a/b/pic"), "");
        assert_eq!(file_extension("https://images.example/v1/fill/pic.final.png"), ".png");
    }

    #[test]
    fn item_name_is_last_url_segment() {
        assert_eq!(
            item_name("https://www.deviantart.com/artist/art/Sunset-123"),
            Some("Sunset-123")
        );
        assert_eq!(
            item_name("https://www.deviantart.com/artist/art/Sunset-123/"),
            Some("Sunset-123")
        );
        assert_eq!(item_name(""), None);
    }

    #[tokio::test]
    async fn existing_file_is_not_fetched_again() {
        let f = fixture(MemoryImages::default().with("https://images.example/a.png", b"new"));
        std::fs::write(f.dir.path().join("piece.png"), b"old").unwrap();

        let outcome = f
            .downloader
            .save_from_url("https://images.example/a.png", f.dir.path(), "piece")
            .await
            .unwrap();

        assert_eq!(outcome, SaveOutcome::Skipped);
        assert!(f.fetched.lock().unwrap().is_empty());
        assert_eq!(std::fs::read(f.dir.path().join("piece.png")).unwrap(), b"old");
        assert_eq!(
            f.reporter.events(),
            vec![ProgressEvent::Skipped {
                name: "piece".into()
            }]
        );
    }

    #[tokio::test]
    async fn folder_items_are_saved_by_page_name() {
        let f = fixture(
            MemoryImages::default()
                .with("https://images.example/sunset.jpg", b"sun")
                .with("https://images.example/moon.png", b"moon"),
        );
        f.transport.push(
            "/api/v1/oauth2/gallery/F2",
            200,
            listing(
                vec![
                    art("artist", "Sunset-1", "https://images.example/sunset.jpg"),
                    Value::Null,
                    art("artist", "Moon-2", "https://images.example/moon.png"),
                ],
                None,
            ),
        );

        let summary = f
            .downloader
            .download_folder("artist", "F2", f.dir.path())
            .await
            .unwrap();

        assert_eq!(summary.downloaded, 2);
        assert_eq!(std::fs::read(f.dir.path().join("Sunset-1.jpg")).unwrap(), b"sun");
        assert_eq!(std::fs::read(f.dir.path().join("Moon-2.png")).unwrap(), b"moon");
    }

    #[tokio::test]
    async fn art_scan_stops_once_everything_is_found() {
        let f = fixture(
            MemoryImages::default()
                .with("https://images.example/one.jpg", b"1")
                .with("https://images.example/two.jpg", b"2"),
        );
        f.transport.push(
            ALL,
            200,
            listing(
                vec![
                    art("artist", "Two-2", "https://images.example/two.jpg"),
                    art("artist", "Other-9", "https://images.example/other.jpg"),
                    art("artist", "One-1", "https://images.example/one.jpg"),
                ],
                Some(3),
            ),
        );

        let summary = f
            .downloader
            .download(
                [art_link("artist", "One-1"), art_link("artist", "Two-2")],
                f.dir.path(),
            )
            .await
            .unwrap();

        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.missing, 0);
        // the second page is never requested
        assert_eq!(f.transport.count(ALL), 1);
        assert!(f.dir.path().join("artist/One-1.jpg").exists());
        assert!(f.dir.path().join("artist/Two-2.jpg").exists());
        assert_eq!(f.fetched.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_arts_are_counted_and_reported() {
        let f = fixture(MemoryImages::default());
        f.transport.push(
            ALL,
            200,
            listing(vec![art("artist", "Other-9", "https://images.example/o.jpg")], None),
        );

        let summary = f
            .downloader
            .download([art_link("artist", "Gone-1")], f.dir.path())
            .await
            .unwrap();

        assert_eq!(summary.missing, 1);
        assert!(f.reporter.events().contains(&ProgressEvent::ArtsNotFound {
            artist: "artist".into(),
            count: 1,
        }));
    }

    #[tokio::test]
    async fn art_already_on_disk_needs_no_api_call() {
        let f = fixture(MemoryImages::default());
        std::fs::create_dir_all(f.dir.path().join("artist")).unwrap();
        std::fs::write(f.dir.path().join("artist/Old-1.jpg"), b"old").unwrap();

        let summary = f
            .downloader
            .download([art_link("artist", "Old-1")], f.dir.path())
            .await
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert!(f.transport.requests().is_empty());
        assert_eq!(
            f.reporter.events(),
            vec![ProgressEvent::Skipped {
                name: "artist/Old-1".into()
            }]
        );
    }

    #[tokio::test]
    async fn folder_links_match_by_slug() {
        let f = fixture(MemoryImages::default().with("https://images.example/d.jpg", b"d"));
        f.transport.push(
            FOLDERS,
            200,
            listing(
                vec![
                    json!({"folderid": "F1", "name": "Featured"}),
                    json!({"folderid": "F2", "name": "Digital Art"}),
                ],
                None,
            ),
        );
        f.transport.push(
            "/api/v1/oauth2/gallery/F2",
            200,
            listing(vec![art("artist", "Dig-1", "https://images.example/d.jpg")], None),
        );

        let summary = f
            .downloader
            .download(
                [
                    "https://www.deviantart.com/artist/gallery/12/digital-art",
                    "https://www.deviantart.com/artist/gallery/34/sketches",
                ],
                f.dir.path(),
            )
            .await
            .unwrap();

        assert_eq!(summary.downloaded, 1);
        assert_eq!(summary.missing, 1);
        assert!(f.dir.path().join("artist/Dig-1.jpg").exists());
        assert_eq!(f.transport.count("/api/v1/oauth2/gallery/F1"), 0);
        assert!(f.reporter.events().contains(&ProgressEvent::FolderNotFound {
            artist: "artist".into(),
            folder: "sketches".into(),
        }));
    }

    #[tokio::test]
    async fn unsupported_links_are_reported() {
        let f = fixture(MemoryImages::default());

        let summary = f
            .downloader
            .download(
                ["https://www.deviantart.com/artist/favourites", "not a url"],
                f.dir.path(),
            )
            .await
            .unwrap();

        assert_eq!(summary, DownloadSummary::default());
        assert!(f.transport.requests().is_empty());
        assert_eq!(
            f.reporter.events(),
            vec![
                ProgressEvent::UnsupportedLink {
                    url: "https://www.deviantart.com/artist/favourites".into()
                },
                ProgressEvent::UnsupportedLink {
                    url: "not a url".into()
                },
            ]
        );
    }

    async fn start_image_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let app = axum::Router::new()
                .route("/img/pic.png", get(|| async { vec![7u8; 4096] }))
                .route("/img/gone.png", get(|| async { StatusCode::NOT_FOUND }));
            axum::serve(listener, app).await.unwrap();
        });
        url
    }

    #[tokio::test]
    async fn http_fetcher_streams_into_place() {
        let base = start_image_server().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pic.png");
        let fetcher = HttpImageFetcher::with_timeout(Duration::from_secs(5)).unwrap();

        let written = fetcher
            .fetch_to(&format!("{base}/img/pic.png"), &dest)
            .await
            .unwrap();

        assert_eq!(written, 4096);
        assert_eq!(std::fs::read(&dest).unwrap().len(), 4096);
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn http_fetcher_leaves_nothing_on_failure() {
        let base = start_image_server().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("gone.png");
        let fetcher = HttpImageFetcher::with_timeout(Duration::from_secs(5)).unwrap();

        let err = fetcher
            .fetch_to(&format!("{base}/img/gone.png"), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
