use std::io;

use chrono::{SecondsFormat, Utc};
use ramhorns::Template;
use serde_json::json;

use crate::config::{Config, Site};
use crate::content::Post;
use crate::rich_text;
use crate::sitemap::full_link;
use crate::text_utils::{excerpt_from_body, format_optional_date};
use crate::view::{parse_template, post_link, ArticleItem, ViewTag};

const UNKNOWN_AUTHOR: &str = "Unknown Author";
const DESCRIPTION_LENGTH: usize = 160;

#[derive(ramhorns::Content)]
struct ViewItem<'a> {
    site_name: &'a str,
    year: String,
    post_title: &'a str,
    description: String,
    canonical_url: String,
    author: &'a str,
    date: String,
    tags: Vec<ViewTag>,
    categories: String,
    reading_minutes: u32,
    has_image: bool,
    image_url: &'a str,
    post_content: String,
    json_ld: String,
    share_list: Vec<ShareLink>,
    related: Vec<ArticleItem>,
    has_related: bool,
}

#[derive(ramhorns::Content)]
struct ShareLink {
    name: &'static str,
    link: String,
}

pub struct PostRenderer<'a> {
    template: Template<'a>,
    site: Site,
    words_per_minute: usize,
}

impl PostRenderer<'_> {
    pub fn new<'a>(view_tpl_src: &'a str, config: &Config) -> io::Result<PostRenderer<'a>> {
        let template = parse_template(view_tpl_src, "post view")?;

        Ok(PostRenderer {
            template,
            site: config.site.clone(),
            words_per_minute: config.blog.words_per_minute,
        })
    }

    pub fn render(&self, post: &Post, related: &[Post]) -> String {
        let canonical_url = full_link(&self.site.base_url, &post_link(post));
        let description = match post.excerpt {
            Some(ref excerpt) if !excerpt.trim().is_empty() => excerpt.clone(),
            _ => excerpt_from_body(&post.body, DESCRIPTION_LENGTH, &self.site.description),
        };
        let author = post.author.as_ref()
            .map(|a| a.name.as_str())
            .or(self.site.default_author.as_deref())
            .unwrap_or(UNKNOWN_AUTHOR);
        let image_url = post.main_image.as_ref().map(|i| i.url.as_str()).unwrap_or_default();
        let reading_minutes = rich_text::estimate_reading_minutes(&post.body, self.words_per_minute);
        let json_ld = self.json_ld(post, &description, author, &canonical_url);
        let related: Vec<ArticleItem> = related.iter().map(ArticleItem::from_post).collect();

        self.template.render(&ViewItem {
            site_name: &self.site.name,
            year: Utc::now().format("%Y").to_string(),
            post_title: &post.title,
            canonical_url: canonical_url.clone(),
            author,
            date: format_optional_date(post.published_at.as_ref()),
            tags: post.categories.iter().map(|c| ViewTag { tag: c.title.clone() }).collect(),
            categories: post.categories.iter().map(|c| c.title.as_str()).collect::<Vec<_>>().join(", "),
            reading_minutes: reading_minutes as u32,
            has_image: !image_url.is_empty(),
            image_url,
            post_content: rich_text::render(&post.body).to_html(),
            json_ld,
            share_list: share_links(&post.title, &canonical_url),
            has_related: !related.is_empty(),
            related,
            description,
        })
    }

    // Structured data for search engines. Embedded in a script tag, so a
    // closing tag sequence must not appear verbatim.
    fn json_ld(&self, post: &Post, description: &str, author: &str, canonical_url: &str) -> String {
        let date = |d: Option<&chrono::DateTime<Utc>>| d.map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true));
        let value = json!({
            "@context": "https://schema.org",
            "@type": "BlogPosting",
            "headline": post.title,
            "description": description,
            "image": post.main_image.as_ref().map(|i| i.url.as_str()),
            "datePublished": date(post.published_at.as_ref()),
            "dateModified": date(post.last_modified().as_ref()),
            "author": { "@type": "Person", "name": author },
            "publisher": { "@type": "Organization", "name": self.site.name },
            "mainEntityOfPage": canonical_url,
        });
        value.to_string().replace("</", "<\\/")
    }
}

fn encode(params: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(params).unwrap_or_default()
}

fn share_links(title: &str, url: &str) -> Vec<ShareLink> {
    let title_and_url = format!("{} {}", title, url);
    vec![
        ShareLink { name: "Twitter", link: format!("https://twitter.com/intent/tweet?{}", encode(&[("url", url), ("text", title)])) },
        ShareLink { name: "Facebook", link: format!("https://www.facebook.com/sharer/sharer.php?{}", encode(&[("u", url)])) },
        ShareLink { name: "LinkedIn", link: format!("https://www.linkedin.com/sharing/share-offsite/?{}", encode(&[("url", url)])) },
        ShareLink { name: "WhatsApp", link: format!("https://wa.me/?{}", encode(&[("text", &title_and_url)])) },
        ShareLink { name: "Email", link: format!("mailto:?{}", encode(&[("subject", title), ("body", url)])) },
    ]
}
