use std::io;

use chrono::Utc;
use ramhorns::Template;

use crate::config::Config;
use crate::content::Post;
use crate::forms::SubmissionStatus;
use crate::view::{parse_template, ArticleItem};

#[derive(ramhorns::Content)]
struct PageView<'a> {
    site_name: &'a str,
    site_description: &'a str,
    base_url: &'a str,
    year: String,
    latest_articles: Vec<ArticleItem>,
    has_articles: bool,
    has_status: bool,
    status_success: bool,
    status_message: &'a str,
}

/// Static pages: home, about, services, contact and the legal pages.
pub struct PageRenderer<'a> {
    template: Template<'a>,
}

impl PageRenderer<'_> {
    pub fn new<'a>(page_tpl_src: &'a str, name: &str) -> io::Result<PageRenderer<'a>> {
        Ok(PageRenderer {
            template: parse_template(page_tpl_src, name)?,
        })
    }

    pub fn render(&self, config: &Config, latest: &[&Post], status: Option<&SubmissionStatus>) -> String {
        let latest_articles: Vec<ArticleItem> = latest.iter().map(|p| ArticleItem::from_post(p)).collect();

        self.template.render(&PageView {
            site_name: &config.site.name,
            site_description: &config.site.description,
            base_url: &config.site.base_url,
            year: Utc::now().format("%Y").to_string(),
            has_articles: !latest_articles.is_empty(),
            latest_articles,
            has_status: status.is_some(),
            status_success: status.is_some_and(|s| s.success),
            status_message: status.map(|s| s.message).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::test_data::{CONFIG_DATA, POSTS_JSON};

    const TEMPLATE: &str = r##"<title>{{site_name}}</title>
LATEST=[{{#latest_articles}}({{title}}|{{date}}){{/latest_articles}}]
STATUS=[{{#has_status}}{{#status_success}}ok{{/status_success}}:{{status_message}}{{/has_status}}]"##;

    #[test]
    fn render_home_with_articles() {
        let config = parse_config(CONFIG_DATA).unwrap();
        let posts: Vec<Post> = serde_json::from_str(POSTS_JSON).unwrap();
        let latest = crate::listing::recent_posts(&posts, 3);
        let renderer = PageRenderer::new(TEMPLATE, "index").unwrap();

        let res = renderer.render(&config, &latest, None);
        assert!(res.contains("<title>Acme Studio</title>"));
        assert!(res.contains("LATEST=[(SEO Basics for Beginners|June 1, 2024)(Choosing a Web Stack|March 15, 2024)"));
        assert!(res.contains("STATUS=[]"));
    }

    #[test]
    fn render_status() {
        let config = parse_config(CONFIG_DATA).unwrap();
        let renderer = PageRenderer::new(TEMPLATE, "contact").unwrap();

        let res = renderer.render(&config, &[], Some(&SubmissionStatus::contact(true)));
        assert!(res.contains("STATUS=[ok:Message sent successfully!]"));

        let res = renderer.render(&config, &[], Some(&SubmissionStatus::newsletter(false)));
        assert!(res.contains("STATUS=[:Something went wrong. Try again.]"));
    }

    #[test]
    fn invalid_template() {
        let err = PageRenderer::new("{{/latest_articles}}", "broken").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(err.to_string().starts_with("Error parsing broken template"));

        assert!(PageRenderer::new("<title>{{site_name</title>", "broken").is_err());
        assert!(PageRenderer::new("{{>header}}", "broken").is_err());
    }
}
