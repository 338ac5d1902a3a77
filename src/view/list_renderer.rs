use std::io;

use chrono::Utc;
use ramhorns::Template;

use crate::config::Config;
use crate::content::Post;
use crate::listing::{CategoryFilter, ListPage, ListQuery, SortOrder, ALL_CATEGORIES};
use crate::query_string::list_link;
use crate::text_utils::{format_optional_date, highlight, segments_to_html, truncate};
use crate::view::{parse_template, post_link, ArticleItem, ViewTag};

#[derive(ramhorns::Content)]
struct ListView<'a> {
    site_name: &'a str,
    year: String,
    query: &'a str,
    category_label: &'a str,
    sort_label: &'a str,
    total_items: u32,
    post_list: Vec<PostItem>,
    category_list: Vec<OptionLink>,
    sort_list: Vec<OptionLink>,
    page_list: Vec<ViewPagination>,
    recent_posts: Vec<ArticleItem>,
    show_pagination: bool,
    has_prev: bool,
    prev_link: String,
    has_next: bool,
    next_link: String,
    no_results: bool,
    fetch_failed: bool,
}

#[derive(ramhorns::Content)]
struct PostItem {
    date: String,
    link: String,
    title: String,
    summary: String,
    has_image: bool,
    image_url: String,
    categories: Vec<ViewTag>,
}

#[derive(ramhorns::Content)]
struct OptionLink {
    label: String,
    link: String,
    selected: bool,
}

#[derive(ramhorns::Content)]
struct ViewPagination {
    current: bool,
    number: u32,
    link: String,
}

pub struct ListRenderer<'a> {
    template: Template<'a>,
    site_name: String,
    excerpt_length: usize,
    categories: Vec<String>,
}

impl ListRenderer<'_> {
    pub fn new<'a>(list_tpl_src: &'a str, config: &Config) -> io::Result<ListRenderer<'a>> {
        let template = parse_template(list_tpl_src, "list")?;

        Ok(ListRenderer {
            template,
            site_name: config.site.name.clone(),
            excerpt_length: config.blog.excerpt_length,
            categories: config.blog.categories.clone(),
        })
    }

    /// Renders one page of the listing. Titles and summaries have the search
    /// text highlighted.
    pub fn render(&self, page: &ListPage, query: &ListQuery, cur_page: usize, recent: &[&Post]) -> String {
        let post_list = page.items.iter()
            .map(|post| self.post_item(post, &query.text))
            .collect();

        let page_list: Vec<ViewPagination> = (1..=page.total_pages)
            .map(|number| ViewPagination {
                current: number == cur_page,
                number: number as u32,
                link: list_link(query, number),
            })
            .collect();

        let has_prev = cur_page > 1 && cur_page <= page.total_pages;
        let has_next = cur_page < page.total_pages;

        self.template.render(&ListView {
            site_name: &self.site_name,
            year: Utc::now().format("%Y").to_string(),
            query: &query.text,
            category_label: query.category.label(),
            sort_label: query.sort.label(),
            total_items: page.total_items as u32,
            post_list,
            category_list: self.category_links(query),
            sort_list: sort_links(query),
            show_pagination: page.total_pages > 1,
            page_list,
            recent_posts: recent.iter().map(|p| ArticleItem::from_post(p)).collect(),
            has_prev,
            prev_link: if has_prev { list_link(query, cur_page - 1) } else { String::new() },
            has_next,
            next_link: if has_next { list_link(query, cur_page + 1) } else { String::new() },
            no_results: page.items.is_empty(),
            fetch_failed: false,
        })
    }

    /// Listing shown when the content store could not be reached.
    pub fn render_fetch_failed(&self, query: &ListQuery) -> String {
        self.template.render(&ListView {
            site_name: &self.site_name,
            year: Utc::now().format("%Y").to_string(),
            query: &query.text,
            category_label: query.category.label(),
            sort_label: query.sort.label(),
            total_items: 0,
            post_list: vec![],
            category_list: self.category_links(query),
            sort_list: sort_links(query),
            page_list: vec![],
            recent_posts: vec![],
            show_pagination: false,
            has_prev: false,
            prev_link: String::new(),
            has_next: false,
            next_link: String::new(),
            no_results: false,
            fetch_failed: true,
        })
    }

    fn post_item(&self, post: &Post, text: &str) -> PostItem {
        let excerpt = post.excerpt.as_deref().unwrap_or_default();
        let summary = truncate(excerpt, self.excerpt_length);

        PostItem {
            date: format_optional_date(post.published_at.as_ref()),
            link: post_link(post),
            title: segments_to_html(&highlight(&post.title, text)),
            summary: segments_to_html(&highlight(&summary, text)),
            has_image: post.main_image.is_some(),
            image_url: post.main_image.as_ref().map(|i| i.url.clone()).unwrap_or_default(),
            categories: post.categories.iter()
                .map(|c| ViewTag { tag: c.title.clone() })
                .collect(),
        }
    }

    fn category_links(&self, query: &ListQuery) -> Vec<OptionLink> {
        let names = std::iter::once(ALL_CATEGORIES).chain(self.categories.iter().map(String::as_str));
        names.map(|name| {
            let category = CategoryFilter::from(name);
            let selected = category == query.category;
            let link = list_link(&ListQuery { category, ..query.clone() }, 1);
            OptionLink { label: name.to_string(), link, selected }
        }).collect()
    }
}

fn sort_links(query: &ListQuery) -> Vec<OptionLink> {
    SortOrder::ALL.iter().map(|sort| OptionLink {
        label: sort.label().to_string(),
        link: list_link(&ListQuery { sort: *sort, ..query.clone() }, 1),
        selected: *sort == query.sort,
    }).collect()
}
