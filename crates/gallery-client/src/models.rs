//! Display-friendly records built from raw API payloads

use serde::{Deserialize, Serialize};

/// Gallery folder as returned by `gallery/folders`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFolder {
    pub folderid: String,
    pub name: String,
    #[serde(default)]
    pub has_subfolders: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    pub id: String,
    /// Slug form of the name, as it appears in gallery URLs
    pub name: String,
    pub pretty_name: String,
}

impl From<RawFolder> for Folder {
    fn from(raw: RawFolder) -> Self {
        Self {
            id: raw.folderid,
            name: normalize_folder_name(&raw.name),
            pretty_name: raw.name,
        }
    }
}

/// Lowercase with spaces turned into hyphens: "Digital Art" -> "digital-art".
pub fn normalize_folder_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}
