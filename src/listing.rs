//! Blog listing pipeline: text filter, category filter, stable sort and
//! fixed-size paging over an already fetched snapshot of posts.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use unidecode::unidecode;

use crate::content::Post;
use crate::paginator::Paginator;

pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    AToZ,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::Newest, SortOrder::Oldest, SortOrder::AToZ];

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Newest => "Newest",
            SortOrder::Oldest => "Oldest",
            SortOrder::AToZ => "A–Z",
        }
    }

    fn compare(&self, a: &Post, b: &Post) -> Ordering {
        match self {
            SortOrder::Newest => b.published_at.cmp(&a.published_at),
            SortOrder::Oldest => a.published_at.cmp(&b.published_at),
            SortOrder::AToZ => compare_titles(&a.title, &b.title),
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "a–z" | "a-z" | "az" => Ok(SortOrder::AToZ),
            other => Err(format!("Unknown sort order: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => post.has_category(name),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Named(name) => name,
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        if value.is_empty() || value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Named(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListQuery {
    pub text: String,
    pub category: CategoryFilter,
    pub sort: SortOrder,
}

#[derive(Debug)]
pub struct ListPage<'a> {
    pub items: Vec<&'a Post>,
    pub total_pages: usize,
    pub total_items: usize,
}

// Alphabetical order close to a locale collation: diacritics and case are
// ignored first, the raw title breaks ties.
fn compare_titles(a: &str, b: &str) -> Ordering {
    let key_a = unidecode(a).to_lowercase();
    let key_b = unidecode(b).to_lowercase();
    key_a.cmp(&key_b).then_with(|| a.cmp(b))
}

pub fn matches_text(post: &Post, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    post.title.to_lowercase().contains(&query)
        || post.excerpt.as_ref().is_some_and(|e| e.to_lowercase().contains(&query))
}

/// Filtered and sorted view of `posts`. The input is left untouched.
pub fn filter_and_sort<'a>(posts: &'a [Post], query: &ListQuery) -> Vec<&'a Post> {
    let mut filtered: Vec<&Post> = posts.iter()
        .filter(|post| matches_text(post, &query.text))
        .filter(|post| query.category.matches(post))
        .collect();

    // sort_by is stable: equal keys keep their snapshot order
    filtered.sort_by(|a, b| query.sort.compare(a, b));
    filtered
}

/// One page of the listing. `page_number` is 1-based; a page past the end
/// (or 0) yields no items while `total_pages` still reflects the filtered set.
pub fn list_page<'a>(posts: &'a [Post], query: &ListQuery, page_number: usize, page_size: usize) -> ListPage<'a> {
    let filtered = filter_and_sort(posts, query);
    let paginator = Paginator::from(&filtered, page_size);

    ListPage {
        items: paginator.get_page(page_number).to_vec(),
        total_pages: paginator.page_count(),
        total_items: filtered.len(),
    }
}

/// The `count` most recently published posts.
pub fn recent_posts(posts: &[Post], count: usize) -> Vec<&Post> {
    let mut recent: Vec<&Post> = posts.iter().collect();
    recent.sort_by(|a, b| SortOrder::Newest.compare(a, b));
    recent.truncate(count);
    recent
}

/// Up to `count` other posts sharing a category with `post`, newest first.
pub fn related_posts<'a>(posts: &'a [Post], post: &Post, count: usize) -> Vec<&'a Post> {
    let mut related: Vec<&Post> = posts.iter()
        .filter(|other| other.slug != post.slug && other.shares_category_with(post))
        .collect();
    related.sort_by(|a, b| SortOrder::Newest.compare(a, b));
    related.truncate(count);
    related
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::content::{Category, PostId};

    fn post(title: &str, date: Option<&str>, categories: &[&str], excerpt: Option<&str>) -> Post {
        Post {
            id: PostId(title.to_lowercase()),
            title: title.to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
            body: vec![],
            published_at: date.and_then(crate::text_utils::parse_timestamp),
            updated_at: None,
            categories: categories.iter()
                .map(|c| Category { id: None, title: c.to_string() })
                .collect(),
            main_image: None,
            excerpt: excerpt.map(str::to_string),
            author: None,
        }
    }

    fn alpha_beta() -> Vec<Post> {
        vec![
            post("Alpha", Some("2024-01-01"), &["SEO"], None),
            post("Beta", Some("2024-06-01"), &["Web Development"], None),
        ]
    }

    fn titles(items: &[&Post]) -> Vec<String> {
        items.iter().map(|p| p.title.clone()).collect()
    }

    #[test]
    fn test_newest_first() {
        let posts = alpha_beta();
        let page = list_page(&posts, &ListQuery::default(), 1, 6);
        assert_eq!(titles(&page.items), ["Beta", "Alpha"]);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_items, 2);
    }

    #[test]
    fn test_category_filter() {
        let posts = alpha_beta();
        let query = ListQuery { category: CategoryFilter::from("SEO"), ..Default::default() };
        let page = list_page(&posts, &query, 1, 6);
        assert_eq!(titles(&page.items), ["Alpha"]);

        let query = ListQuery { category: CategoryFilter::from("seo"), ..Default::default() };
        assert!(list_page(&posts, &query, 1, 6).items.is_empty());
    }

    #[test]
    fn test_text_query_case_insensitive() {
        let posts = alpha_beta();
        let query = ListQuery { text: "bet".to_string(), sort: SortOrder::AToZ, ..Default::default() };
        let page = list_page(&posts, &query, 1, 6);
        assert_eq!(titles(&page.items), ["Beta"]);

        let query = ListQuery { text: "ALP".to_string(), ..Default::default() };
        assert_eq!(titles(&list_page(&posts, &query, 1, 6).items), ["Alpha"]);
    }

    #[test]
    fn test_excerpt_match_and_missing_excerpt() {
        let posts = vec![
            post("One", Some("2024-01-01"), &[], Some("All about caching")),
            post("Two", Some("2024-01-02"), &[], None),
        ];
        let query = ListQuery { text: "CACHING".to_string(), ..Default::default() };
        assert_eq!(titles(&list_page(&posts, &query, 1, 6).items), ["One"]);
    }

    #[test]
    fn test_empty_query_keeps_everything_sorted() {
        let posts = vec![
            post("b", Some("2024-02-01"), &[], None),
            post("C", Some("2024-01-01"), &[], None),
            post("a", Some("2024-03-01"), &[], None),
        ];
        let oldest = ListQuery { sort: SortOrder::Oldest, ..Default::default() };
        assert_eq!(titles(&list_page(&posts, &oldest, 1, 6).items), ["C", "b", "a"]);
        let az = ListQuery { sort: SortOrder::AToZ, ..Default::default() };
        assert_eq!(titles(&list_page(&posts, &az, 1, 6).items), ["a", "b", "C"]);
    }

    #[test]
    fn test_alphabetical_ignores_diacritics() {
        let posts = vec![
            post("Zebra", None, &[], None),
            post("Évora", None, &[], None),
            post("Apple", None, &[], None),
        ];
        let az = ListQuery { sort: SortOrder::AToZ, ..Default::default() };
        assert_eq!(titles(&list_page(&posts, &az, 1, 6).items), ["Apple", "Évora", "Zebra"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let posts = vec![
            post("First", Some("2024-05-05"), &[], None),
            post("Second", Some("2024-05-05"), &[], None),
            post("Third", Some("2024-05-05"), &[], None),
        ];
        for sort in [SortOrder::Newest, SortOrder::Oldest] {
            let query = ListQuery { sort, ..Default::default() };
            assert_eq!(titles(&list_page(&posts, &query, 1, 6).items), ["First", "Second", "Third"]);
        }
    }

    #[test]
    fn test_unparsable_dates_are_earliest() {
        let posts = vec![
            post("Broken", Some("not a date"), &[], None),
            post("Dated", Some("2020-01-01"), &[], None),
        ];
        let newest = ListQuery::default();
        assert_eq!(titles(&list_page(&posts, &newest, 1, 6).items), ["Dated", "Broken"]);
        let oldest = ListQuery { sort: SortOrder::Oldest, ..Default::default() };
        assert_eq!(titles(&list_page(&posts, &oldest, 1, 6).items), ["Broken", "Dated"]);
    }

    #[test]
    fn test_pages_cover_filtered_set_once() {
        let posts: Vec<Post> = (0..14)
            .map(|i| post(&format!("Post {:02}", i), Some(format!("2024-01-{:02}", i + 1).as_str()), &[], None))
            .collect();
        let query = ListQuery::default();
        let first = list_page(&posts, &query, 1, 6);
        assert_eq!(first.total_pages, 3);

        let mut all = vec![];
        for page in 1..=first.total_pages {
            all.extend(titles(&list_page(&posts, &query, page, 6).items));
        }
        let expected = titles(&filter_and_sort(&posts, &query));
        assert_eq!(all, expected);
        assert_eq!(all.len(), 14);
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let posts = alpha_beta();
        let page = list_page(&posts, &ListQuery::default(), 2, 6);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_filter_is_idempotent_and_pure() {
        let posts = alpha_beta();
        let before = posts.clone();
        let query = ListQuery { text: "a".to_string(), ..Default::default() };
        let once = titles(&filter_and_sort(&posts, &query));
        let twice = titles(&filter_and_sort(&posts, &query));
        assert_eq!(once, twice);
        assert_eq!(posts, before);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("Newest".parse::<SortOrder>(), Ok(SortOrder::Newest));
        assert_eq!("oldest".parse::<SortOrder>(), Ok(SortOrder::Oldest));
        assert_eq!("A–Z".parse::<SortOrder>(), Ok(SortOrder::AToZ));
        assert_eq!("a-z".parse::<SortOrder>(), Ok(SortOrder::AToZ));
        assert!("random".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::AToZ.to_string(), "A–Z");
    }

    #[test]
    fn test_category_filter_from_str() {
        assert_eq!(CategoryFilter::from("All"), CategoryFilter::All);
        assert_eq!(CategoryFilter::from(""), CategoryFilter::All);
        assert_eq!(CategoryFilter::from("SEO"), CategoryFilter::Named("SEO".to_string()));
    }

    #[test]
    fn test_recent_and_related() {
        let posts = vec![
            post("Old SEO", Some("2023-01-01"), &["SEO"], None),
            post("Current", Some("2024-01-01"), &["SEO", "Tools"], None),
            post("New Tools", Some("2024-05-01"), &["Tools"], None),
            post("Unrelated", Some("2024-06-01"), &["Design"], None),
        ];
        assert_eq!(titles(&recent_posts(&posts, 3)), ["Unrelated", "New Tools", "Current"]);
        assert_eq!(titles(&related_posts(&posts, &posts[1], 3)), ["New Tools", "Old SEO"]);
    }

    #[test]
    fn test_dates_compare() {
        let posts = alpha_beta();
        assert!(posts[1].published_at > posts[0].published_at);
        assert_eq!(posts[0].published_at, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    }
}
