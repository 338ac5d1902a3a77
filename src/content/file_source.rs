use std::fs;
use std::path::PathBuf;

use spdlog::debug;

use crate::content::content_source::{ContentSource, SourceError};
use crate::content::{posts_from_values, Post};

/// Content store backed by a JSON snapshot on disk: an array of posts in
/// the same shape the HTTP store returns. The file is re-read on every
/// fetch so edits show up without a restart.
pub struct FileSource {
    pub snapshot_path: PathBuf,
}

impl FileSource {
    pub fn new(snapshot_path: PathBuf) -> Self {
        FileSource { snapshot_path }
    }
}

impl ContentSource for FileSource {
    fn fetch_posts(&self) -> Result<Vec<Post>, SourceError> {
        debug!("Reading post snapshot from {}", self.snapshot_path.display());
        let raw = fs::read_to_string(&self.snapshot_path)?;
        let values: Vec<serde_json::Value> = serde_json::from_str(&raw)?;
        Ok(posts_from_values(values))
    }

    fn fetch_post(&self, slug: &str) -> Result<Option<Post>, SourceError> {
        let posts = self.fetch_posts()?;
        Ok(posts.into_iter().find(|p| p.slug == slug))
    }
}
