use chrono::{DateTime, Utc};

use crate::content::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFrequency {
    Weekly,
    Monthly,
    Yearly,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub last_modified: DateTime<Utc>,
    pub change_frequency: ChangeFrequency,
    pub priority: f32,
}

pub const STATIC_ROUTES: [(&str, ChangeFrequency, f32); 7] = [
    ("/", ChangeFrequency::Weekly, 1.0),
    ("/about", ChangeFrequency::Monthly, 0.8),
    ("/services", ChangeFrequency::Monthly, 0.8),
    ("/contact", ChangeFrequency::Monthly, 0.8),
    ("/privacy-policy", ChangeFrequency::Yearly, 0.5),
    ("/terms-and-conditions", ChangeFrequency::Yearly, 0.5),
    ("/disclaimer", ChangeFrequency::Yearly, 0.5),
];

const BLOG_PRIORITY: f32 = 0.7;

pub fn full_link(base_url: &str, path: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base_url, path)
    } else {
        format!("{}/{}", base_url, path)
    }
}

/// Static routes first, then one entry per blog post in snapshot order.
/// Posts without any timestamp use `now` as last modification.
pub fn build_sitemap(base_url: &str, posts: &[Post], now: DateTime<Utc>) -> Vec<SitemapEntry> {
    let static_entries = STATIC_ROUTES.iter().map(|(path, change_frequency, priority)| SitemapEntry {
        loc: full_link(base_url, path),
        last_modified: now,
        change_frequency: *change_frequency,
        priority: *priority,
    });

    let post_entries = posts.iter().map(|post| SitemapEntry {
        loc: full_link(base_url, &post.path()),
        last_modified: post.last_modified().unwrap_or(now),
        change_frequency: ChangeFrequency::Monthly,
        priority: BLOG_PRIORITY,
    });

    static_entries.chain(post_entries).collect()
}
