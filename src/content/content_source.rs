use std::io;

use thiserror::Error;

use crate::content::Post;
use crate::listing::related_posts;

/// Error while reading posts from a content store.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network error, timeout or TLS failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    /// The store answered with a non-success status.
    #[error("content store answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid content payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The background task running the fetch was dropped.
    #[error("content fetch was canceled")]
    Canceled,
}

/// Read port over the content store. Implementations return owned
/// snapshots; callers never write back.
pub trait ContentSource: Send + Sync {
    /// Every published post, without bodies when the store can skip them.
    fn fetch_posts(&self) -> Result<Vec<Post>, SourceError>;

    /// A single post with its full body.
    fn fetch_post(&self, slug: &str) -> Result<Option<Post>, SourceError>;

    /// Posts sharing a category with `post`, newest first.
    fn fetch_related(&self, post: &Post, limit: usize) -> Result<Vec<Post>, SourceError> {
        let posts = self.fetch_posts()?;
        Ok(related_posts(&posts, post, limit).into_iter().cloned().collect())
    }
}

impl<S: ContentSource + ?Sized> ContentSource for Box<S> {
    fn fetch_posts(&self) -> Result<Vec<Post>, SourceError> {
        (**self).fetch_posts()
    }

    fn fetch_post(&self, slug: &str) -> Result<Option<Post>, SourceError> {
        (**self).fetch_post(slug)
    }

    fn fetch_related(&self, post: &Post, limit: usize) -> Result<Vec<Post>, SourceError> {
        (**self).fetch_related(post, limit)
    }
}
