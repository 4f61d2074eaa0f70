//! Classification of gallery web links
//!
//! Turns a browser URL into the listing it refers to, so callers can pick
//! between a full gallery run, a single folder, or a single artwork.

use reqwest::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryLink {
    /// `/<artist>` or `/<artist>/gallery/all`
    All { artist: String },
    /// `/<artist>/gallery` (the featured folder) or `/<artist>/gallery/<id>/<slug>`
    Folder { artist: String, folder: String },
    /// `/<artist>/art/<name>`
    Art {
        artist: String,
        name: String,
        url: String,
    },
    Unknown { artist: String },
}

impl GalleryLink {
    pub fn artist(&self) -> &str {
        match self {
            GalleryLink::All { artist }
            | GalleryLink::Folder { artist, .. }
            | GalleryLink::Art { artist, .. }
            | GalleryLink::Unknown { artist } => artist,
        }
    }
}

/// Parse a gallery link. Returns `None` when the URL does not parse or has no artist segment.
pub fn parse_link(url: &str) -> Option<GalleryLink> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect();
    let (artist, rest) = segments.split_first()?;
    let artist = artist.to_string();

    let link = match rest {
        [] | ["gallery", "all", ..] => GalleryLink::All { artist },
        ["gallery"] => GalleryLink::Folder {
            artist,
            folder: "featured".into(),
        },
        ["gallery", _id, slug, ..] => GalleryLink::Folder {
            artist,
            folder: slug.to_string(),
        },
        ["art", name, ..] => GalleryLink::Art {
            artist,
            name: name.to_string(),
            url: url.to_string(),
        },
        _ => GalleryLink::Unknown { artist },
    };
    Some(link)
}
