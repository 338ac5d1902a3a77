use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::Value;
use spdlog::warn;

use crate::text_utils::parse_timestamp;

pub mod content_source;
pub mod file_source;
pub mod portable_text;
pub mod sanity_source;

pub use portable_text::{ContentBlock, ImageBlock, ListKind, Mark, Span, TextBlock};

/// Unreserved path characters: A-Z a-z 0-9 - . _ ~
const SLUG_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct PostId(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub name: String,
}

/// A blog post as delivered by the content store. Posts are read-only
/// snapshots: every listing or rendering derives new values from them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawPost")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub body: Vec<ContentBlock>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub categories: Vec<Category>,
    pub main_image: Option<ImageRef>,
    pub excerpt: Option<String>,
    pub author: Option<Author>,
}

impl Post {
    pub fn has_category(&self, title: &str) -> bool {
        self.categories.iter().any(|c| c.title == title)
    }

    pub fn shares_category_with(&self, other: &Post) -> bool {
        self.categories.iter().any(|c| other.has_category(&c.title))
    }

    /// Site-relative link to the post page, with the slug percent-encoded.
    pub fn path(&self) -> String {
        format!("/blog/{}", utf8_percent_encode(&self.slug, SLUG_ENCODE_SET))
    }

    /// Last modification time, used by the sitemap.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.published_at)
    }

    /// Reads one post document. Documents without a usable slug cannot be
    /// linked to and are skipped.
    pub fn from_value(value: Value) -> Option<Post> {
        match serde_json::from_value::<Post>(value) {
            Ok(post) => Some(post),
            Err(e) => {
                warn!("Skipping post: {}", e);
                None
            }
        }
    }
}

/// Reads a list of post documents, dropping the ones `Post::from_value`
/// rejects instead of failing the whole list.
pub fn posts_from_values(values: Vec<Value>) -> Vec<Post> {
    values.into_iter().filter_map(Post::from_value).collect()
}

// Wire shape of a post. The store may project the slug either as a plain
// string or as the `{ current }` object, and images as `{ asset: { url } }`.
#[derive(Deserialize)]
struct RawPost {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    slug: Option<SlugField>,
    #[serde(default)]
    body: Option<Vec<ContentBlock>>,
    #[serde(rename = "publishedAt", default)]
    published_at: Option<String>,
    #[serde(rename = "_updatedAt", default)]
    updated_at: Option<String>,
    #[serde(default)]
    categories: Option<Vec<Option<RawCategory>>>,
    #[serde(rename = "mainImage", default)]
    main_image: Option<RawImage>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    author: Option<RawAuthor>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SlugField {
    Plain(String),
    Object { current: Option<String> },
}

// Dangling references come back as null, so every field is optional.
#[derive(Deserialize)]
struct RawCategory {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Deserialize)]
struct RawAuthor {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct RawImage {
    asset: Option<RawAsset>,
}

#[derive(Deserialize)]
struct RawAsset {
    url: Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

impl TryFrom<RawPost> for Post {
    type Error = String;

    fn try_from(raw: RawPost) -> Result<Self, Self::Error> {
        let slug = match raw.slug {
            Some(SlugField::Plain(s)) => Some(s),
            Some(SlugField::Object { current }) => current,
            None => None,
        };
        let Some(slug) = non_blank(slug) else {
            return Err(format!("post {:?} has no slug", raw.id.unwrap_or_default()));
        };
        let categories = raw.categories
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(|c| Some(Category { id: c.id, title: non_blank(c.title)? }))
            .collect();
        let author = raw.author
            .and_then(|a| non_blank(a.name))
            .map(|name| Author { name });
        let main_image = raw.main_image
            .and_then(|img| img.asset)
            .and_then(|asset| asset.url)
            .map(|url| ImageRef { url });

        Ok(Post {
            id: PostId(raw.id.unwrap_or_else(|| slug.clone())),
            title: raw.title.unwrap_or_default(),
            slug,
            body: raw.body.unwrap_or_default(),
            published_at: raw.published_at.as_deref().and_then(parse_timestamp),
            updated_at: raw.updated_at.as_deref().and_then(parse_timestamp),
            categories,
            main_image,
            excerpt: raw.excerpt,
            author,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, TimeZone};

    use super::*;
    use crate::test_data::POSTS_JSON;

    #[test]
    fn test_deserialize_posts() {
        let posts: Vec<Post> = serde_json::from_str(POSTS_JSON).unwrap();
        assert_eq!(posts.len(), 3);

        let first = &posts[0];
        assert_eq!(first.id, PostId("post-1".to_string()));
        assert_eq!(first.slug, "launching-a-small-business-site");
        assert_eq!(first.published_at, Some(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()));
        assert_eq!(first.main_image, Some(ImageRef { url: "https://cdn.example.com/hero.jpg".to_string() }));
        assert_eq!(first.author, Some(Author { name: "Ada Obi".to_string() }));
        assert!(first.has_category("Web Development"));
        assert!(!first.has_category("web development"));
        assert_eq!(first.body.len(), 2);
    }

    #[test]
    fn test_slug_object_and_missing_fields() {
        let json = r#"{"_id": "x", "title": "Stub", "slug": {"current": "stub"}, "publishedAt": "not a date"}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.slug, "stub");
        assert!(post.body.is_empty());
        assert!(post.categories.is_empty());
        assert_eq!(post.published_at, None);
        assert_eq!(post.excerpt, None);
        assert_eq!(post.main_image, None);
    }

    #[test]
    fn test_last_modified_falls_back_to_publication() {
        let json = r#"{"_id": "x", "title": "T", "slug": "t", "publishedAt": "2024-03-05"}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.last_modified().map(|d| d.month()), Some(3));
    }

    #[test]
    fn test_shares_category() {
        let posts: Vec<Post> = serde_json::from_str(POSTS_JSON).unwrap();
        assert!(posts[0].shares_category_with(&posts[2]));
        assert!(!posts[0].shares_category_with(&posts[1]));
    }

    #[test]
    fn test_missing_author_and_category_fields() {
        let json = r#"{"_id": "x", "slug": "x", "author": {},
            "categories": [{"_id": "c1"}, null, {"_id": "c2", "title": "SEO"}]}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.author, None);
        assert_eq!(post.categories, vec![Category { id: Some("c2".to_string()), title: "SEO".to_string() }]);
    }

    #[test]
    fn test_posts_without_slug_are_skipped() {
        let values: Vec<Value> = serde_json::from_str(r#"[
            {"_id": "a", "title": "Kept", "slug": {"current": "kept"}},
            {"_id": "b", "title": "Draft"},
            {"_id": "c", "title": "Empty", "slug": {"current": null}},
            {"_id": "d", "title": "Blank", "slug": "  "},
            "not a post"
        ]"#).unwrap();
        let posts = posts_from_values(values);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "kept");
    }

    #[test]
    fn test_path_encodes_slug() {
        let post: Post = serde_json::from_str(r#"{"_id": "x", "slug": "café menu/2024"}"#).unwrap();
        assert_eq!(post.path(), "/blog/caf%C3%A9%20menu%2F2024");

        let posts: Vec<Post> = serde_json::from_str(POSTS_JSON).unwrap();
        assert_eq!(posts[0].path(), "/blog/launching-a-small-business-site");
    }
}
