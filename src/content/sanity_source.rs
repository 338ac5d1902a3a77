//! HTTP content store speaking the Sanity query API: GROQ queries sent as
//! GET requests, results wrapped in `{ "result": ... }`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use spdlog::{debug, info};
use ureq::Agent;

use crate::config::Cms;
use crate::content::content_source::{ContentSource, SourceError};
use crate::content::{posts_from_values, ContentBlock, Post};

const DEFAULT_API_VERSION: &str = "2024-01-01";
const DEFAULT_TIMEOUT: u64 = 30;

const ALL_POSTS_QUERY: &str = r#"*[_type == "post"] | order(publishedAt desc){
  _id,
  _updatedAt,
  title,
  "slug": slug.current,
  "excerpt": coalesce(excerpt, pt::text(body)),
  mainImage{ asset->{ url } },
  "author": author->{ name },
  "categories": categories[]->{ _id, title },
  publishedAt
}"#;

const POST_BY_SLUG_QUERY: &str = r#"*[_type == "post" && slug.current == $slug][0]{
  _id,
  _updatedAt,
  title,
  body,
  "slug": slug.current,
  excerpt,
  mainImage{ asset->{ url } },
  "author": author->{ name },
  "categories": categories[]->{ _id, title },
  publishedAt
}"#;

const RELATED_POSTS_QUERY: &str = r#"*[
  _type == "post" &&
  slug.current != $slug &&
  count(categories[@._ref in $categoryIds]) > 0
] | order(publishedAt desc)[0...$limit]{
  _id,
  _updatedAt,
  title,
  "slug": slug.current,
  mainImage{ asset->{ url } },
  publishedAt,
  "categories": categories[]->{ _id, title }
}"#;

#[derive(Deserialize)]
struct QueryResponse<T> {
    result: T,
}

pub struct SanitySource {
    agent: Agent,
    project_id: String,
    dataset: String,
    api_version: String,
    token: Option<String>,
}

impl SanitySource {
    pub fn new(project_id: &str, dataset: &str, api_version: Option<&str>, token: Option<&str>, timeout_secs: Option<u64>) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT))))
            .http_status_as_error(false)
            .build()
            .into();

        SanitySource {
            agent,
            project_id: project_id.to_string(),
            dataset: dataset.to_string(),
            api_version: api_version.unwrap_or(DEFAULT_API_VERSION).trim_start_matches('v').to_string(),
            token: token.map(str::to_string),
        }
    }

    pub fn from_config(cms: &Cms) -> Option<Self> {
        Some(Self::new(
            cms.project_id.as_deref()?,
            cms.dataset.as_deref()?,
            cms.api_version.as_deref(),
            cms.token.as_deref(),
            cms.timeout_secs,
        ))
    }

    /// Query URL with GROQ parameters JSON-encoded as `$name=value` pairs.
    pub fn query_url(&self, query: &str, params: &[(&str, serde_json::Value)]) -> String {
        let mut pairs: Vec<(String, String)> = vec![("query".to_string(), query.to_string())];
        for (name, value) in params {
            pairs.push((format!("${}", name), value.to_string()));
        }
        let encoded = serde_urlencoded::to_string(&pairs).unwrap_or_default();

        format!("https://{}.api.sanity.io/v{}/data/query/{}?{}",
                self.project_id, self.api_version, self.dataset, encoded)
    }

    fn run_query<T: DeserializeOwned>(&self, query: &str, params: &[(&str, serde_json::Value)]) -> Result<T, SourceError> {
        let url = self.query_url(query, params);
        debug!("Querying content store: {}", url);

        let mut request = self.agent.get(&url).header("Accept", "application/json");
        if let Some(ref token) = self.token {
            request = request.header("Authorization", &format!("Bearer {}", token));
        }
        let response = request.call()?;

        let status = response.status().as_u16();
        let mut body = response.into_body();
        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_owned());
            return Err(SourceError::Status { status, body: error_body });
        }

        let res: QueryResponse<T> = body.read_json()?;
        Ok(res.result)
    }

    /// Image blocks fetched raw only carry an asset reference such as
    /// `image-<id>-600x300-png`; turn those into CDN URLs.
    pub fn image_url(&self, asset_ref: &str) -> Option<String> {
        let rest = asset_ref.strip_prefix("image-")?;
        let (name, ext) = rest.rsplit_once('-')?;
        Some(format!("https://cdn.sanity.io/images/{}/{}/{}.{}",
                     self.project_id, self.dataset, name, ext))
    }

    fn resolve_images(&self, post: &mut Post) {
        for block in post.body.iter_mut() {
            if let ContentBlock::Image(image) = block {
                if image.asset_url.is_none() {
                    image.asset_url = image.asset_ref.as_deref().and_then(|r| self.image_url(r));
                }
            }
        }
    }
}

impl ContentSource for SanitySource {
    fn fetch_posts(&self) -> Result<Vec<Post>, SourceError> {
        let values: Vec<serde_json::Value> = self.run_query(ALL_POSTS_QUERY, &[])?;
        let posts = posts_from_values(values);
        info!("Fetched {} posts from the content store", posts.len());
        Ok(posts)
    }

    fn fetch_post(&self, slug: &str) -> Result<Option<Post>, SourceError> {
        let value: Option<serde_json::Value> = self.run_query(POST_BY_SLUG_QUERY, &[("slug", slug.into())])?;
        Ok(value.and_then(Post::from_value).map(|mut post| {
            self.resolve_images(&mut post);
            post
        }))
    }

    fn fetch_related(&self, post: &Post, limit: usize) -> Result<Vec<Post>, SourceError> {
        let category_ids: Vec<serde_json::Value> = post.categories.iter()
            .filter_map(|c| c.id.clone())
            .map(serde_json::Value::from)
            .collect();
        if category_ids.is_empty() {
            return Ok(vec![]);
        }

        let values: Vec<serde_json::Value> = self.run_query(RELATED_POSTS_QUERY, &[
            ("slug", post.slug.as_str().into()),
            ("categoryIds", category_ids.into()),
            ("limit", limit.into()),
        ])?;
        Ok(posts_from_values(values))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn source() -> SanitySource {
        SanitySource::new("abc123", "production", Some("v2024-06-01"), None, None)
    }

    #[test]
    fn test_query_url() {
        let url = source().query_url("*[_type == \"post\"]", &[("slug", json!("hello world"))]);
        assert!(url.starts_with("https://abc123.api.sanity.io/v2024-06-01/data/query/production?query="));
        assert!(url.contains("%24slug=%22hello+world%22"));
    }

    #[test]
    fn test_image_url() {
        let s = source();
        assert_eq!(s.image_url("image-Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000-jpg"),
                   Some("https://cdn.sanity.io/images/abc123/production/Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000.jpg".to_string()));
        assert_eq!(s.image_url("file-xyz-pdf"), None);
    }

    #[test]
    fn test_resolve_images() {
        let s = source();
        let mut post: Post = serde_json::from_value(json!({
            "_id": "p", "title": "T", "slug": "t",
            "body": [{"_type": "image", "asset": {"_ref": "image-abc-10x10-png"}}]
        })).unwrap();
        s.resolve_images(&mut post);
        let ContentBlock::Image(ref image) = post.body[0] else { panic!("expected image") };
        assert_eq!(image.asset_url.as_deref(), Some("https://cdn.sanity.io/images/abc123/production/abc-10x10.png"));
    }

    #[test]
    fn test_related_without_categories() {
        let post: Post = serde_json::from_value(json!({"_id": "p", "title": "T", "slug": "t"})).unwrap();
        assert!(source().fetch_related(&post, 3).unwrap().is_empty());
    }
}
