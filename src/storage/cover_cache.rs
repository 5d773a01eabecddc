use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::Platform;
use crate::errors::FeedResult;
use crate::http::{Headers, HttpClient};

/// `<stem>.jpg`, or `None` when the stem is not a plain identifier
pub fn cover_file_name(stem: &str) -> Option<String> {
    let valid = !stem.is_empty()
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    valid.then(|| format!("{}.jpg", stem))
}

/// Per-platform directory of downloaded cover images.
///
/// Files are named deterministically, so a cover that is already on disk is
/// never fetched again.
#[derive(Debug, Clone)]
pub struct CoverCache {
    site_root: PathBuf,
    relative_dir: String,
}

impl CoverCache {
    pub fn new(site_root: &Path, platform: Platform) -> Self {
        Self {
            site_root: site_root.to_path_buf(),
            relative_dir: platform.cover_dir().to_string(),
        }
    }

    pub fn dir(&self) -> PathBuf {
        self.site_root.join(&self.relative_dir)
    }

    pub fn ensure_dir(&self) -> FeedResult<()> {
        fs::create_dir_all(self.dir())?;
        Ok(())
    }

    pub fn local_path(&self, name: &str) -> PathBuf {
        self.dir().join(name)
    }

    /// Path recorded in the feed, relative to the site root
    pub fn thumbnail_path(&self, name: &str) -> String {
        format!("{}/{}", self.relative_dir, name)
    }

    /// Make sure `name` exists locally, downloading `cover_url` if needed.
    ///
    /// Returns the thumbnail path, or `None` when the image could not be stored.
    pub fn materialize(
        &self,
        http: &HttpClient,
        name: &str,
        cover_url: &str,
        headers: &Headers,
    ) -> Option<String> {
        let local_path = self.local_path(name);

        if local_path.exists() {
            debug!(name, "cover already cached");
        } else if !http.download_image(cover_url, &local_path, headers) && local_path.exists() {
            if let Err(e) = fs::remove_file(&local_path) {
                warn!(path = %local_path.display(), error = %e, "could not remove partial cover");
            }
        }

        local_path.exists().then(|| self.thumbnail_path(name))
    }

    /// Sorted names of cached `.jpg` covers
    pub fn cached_names(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.dir()) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".jpg") && name.len() > ".jpg".len())
            .collect();
        names.sort();

        names
    }
}
