use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use spdlog::info;

use crate::content::content_source::{ContentSource, SourceError};
use crate::content::Post;

pub struct ContentCache<T> {
    cache: Option<RwLock<CacheMap<T>>>,
}

type CacheMap<T> = HashMap<String, CacheValue<T>>;

#[derive(Clone, Copy)]
pub enum Expire {
    Never,
    After(Duration),
}

struct CacheValue<T> {
    expire_date: DateTime<Utc>,
    value: Arc<T>,
}

impl<T> ContentCache<T> {
    pub fn new() -> Self {
        ContentCache {
            cache: Some(RwLock::new(HashMap::new())),
        }
    }

    pub fn non_caching() -> Self {
        ContentCache {
            cache: None,
        }
    }

    /// Stores `content` under `key`. Expired entries are dropped on every
    /// insert, so the map only holds live values.
    pub fn add(&self, key: &str, content: T, expire_after: Expire) -> Arc<T> {
        let value = Arc::new(content);
        if let Some(ref cache) = self.cache {
            let now = Utc::now();
            let expire_date = match expire_after {
                Expire::Never => DateTime::<Utc>::MAX_UTC,
                Expire::After(duration) => now + duration,
            };

            if let Ok(mut cache) = cache.write() {
                cache.retain(|_, v| v.expire_date >= now);
                cache.insert(key.to_string(), CacheValue {
                    expire_date,
                    value: value.clone(),
                });
            }
        }
        value
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let cache = self.cache.as_ref()?.read().ok()?;
        let cache_value = cache.get(key)?;
        if Utc::now() > cache_value.expire_date {
            return None;
        }
        Some(cache_value.value.clone())
    }

    pub fn len(&self) -> usize {
        self.cache.as_ref()
            .and_then(|cache| cache.read().ok())
            .map_or(0, |cache| cache.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached value for `key`, or the result of `f` stored for later calls.
    /// Errors from `f` are returned and nothing is stored.
    pub fn get_or<E, F>(&self, key: &str, expire_after: Expire, f: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let content = f()?;
        Ok(self.add(key, content, expire_after))
    }
}

impl<T> Default for ContentCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps fetched snapshots for a fixed time so bursts of page views do
/// not each hit the content store.
pub struct CachedSource<S> {
    inner: S,
    posts: ContentCache<Vec<Post>>,
    post: ContentCache<Post>,
    expire: Expire,
}

impl<S: ContentSource> CachedSource<S> {
    pub fn new(inner: S, ttl_secs: i64) -> Self {
        info!("Caching content store responses for {} seconds", ttl_secs);
        CachedSource {
            inner,
            posts: ContentCache::new(),
            post: ContentCache::new(),
            expire: Expire::After(Duration::seconds(ttl_secs)),
        }
    }
}

impl<S: ContentSource> ContentSource for CachedSource<S> {
    fn fetch_posts(&self) -> Result<Vec<Post>, SourceError> {
        let posts = self.posts.get_or("posts", self.expire, || self.inner.fetch_posts())?;
        Ok(posts.as_ref().clone())
    }

    fn fetch_post(&self, slug: &str) -> Result<Option<Post>, SourceError> {
        // Misses are not stored.
        let key = format!("post-{}", slug);
        if let Some(post) = self.post.get(&key) {
            return Ok(Some(post.as_ref().clone()));
        }
        let post = self.inner.fetch_post(slug)?;
        if let Some(ref found) = post {
            self.post.add(&key, found.clone(), self.expire);
        }
        Ok(post)
    }

    fn fetch_related(&self, post: &Post, limit: usize) -> Result<Vec<Post>, SourceError> {
        self.inner.fetch_related(post, limit)
    }
}
