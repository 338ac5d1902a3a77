use std::io::ErrorKind;
use std::path::Path;
use std::{fs, io};

use ramhorns::Template;

use crate::content::Post;
use crate::text_utils::{format_optional_date, truncate};

pub mod list_renderer;
pub mod page_renderer;
pub mod post_renderer;
pub mod sitemap_renderer;

const ARTICLE_SUMMARY_LENGTH: usize = 120;

pub fn read_template(tpl_dir: &Path, file_name: &str) -> io::Result<String> {
    let full_path = tpl_dir.join(file_name);
    fs::read_to_string(&full_path).map_err(|e| {
        io::Error::new(e.kind(), format!("Error loading template {}: {}", full_path.display(), e))
    })
}

pub(crate) fn parse_template<'a>(src: &'a str, name: &str) -> io::Result<Template<'a>> {
    Template::new(src).map_err(|e| {
        io::Error::new(ErrorKind::InvalidInput, format!("Error parsing {} template: {}", name, e))
    })
}

pub fn post_link(post: &Post) -> String {
    post.path()
}

#[derive(ramhorns::Content)]
pub(crate) struct ViewTag {
    pub tag: String,
}

/// Card used for the latest articles, recent posts and related posts.
#[derive(ramhorns::Content)]
pub(crate) struct ArticleItem {
    pub title: String,
    pub link: String,
    pub date: String,
    pub summary: String,
    pub has_image: bool,
    pub image_url: String,
}

impl ArticleItem {
    pub fn from_post(post: &Post) -> Self {
        let summary = post.excerpt.as_deref()
            .map(|e| truncate(e, ARTICLE_SUMMARY_LENGTH))
            .unwrap_or_default();
        ArticleItem {
            title: post.title.clone(),
            link: post_link(post),
            date: format_optional_date(post.published_at.as_ref()),
            summary,
            has_image: post.main_image.is_some(),
            image_url: post.main_image.as_ref().map(|i| i.url.clone()).unwrap_or_default(),
        }
    }
}
