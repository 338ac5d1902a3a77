use std::collections::HashMap;

use crate::listing::{CategoryFilter, ListQuery, SortOrder};

#[derive(PartialEq, Debug)]
pub struct QueryString {
    items: HashMap<String, String>,
}

impl QueryString {
    pub fn from(buf: &str) -> Self {
        let vs: Vec<(String, String)> = serde_urlencoded::from_str(buf).unwrap_or_else(|_| vec![]);
        let items: HashMap<String, String> = vs.into_iter().collect();

        QueryString {
            items,
        }
    }

    pub fn empty() -> Self {
        QueryString { items: HashMap::new() }
    }

    pub fn get_page(&self) -> usize {
        self.items.get("page")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1)
    }

    pub fn get_text(&self) -> String {
        self.items.get("q").map(|q| q.trim().to_string()).unwrap_or_default()
    }

    pub fn get_category(&self) -> CategoryFilter {
        self.items.get("category")
            .map(|c| CategoryFilter::from(c.as_str()))
            .unwrap_or_default()
    }

    pub fn get_sort(&self) -> SortOrder {
        self.items.get("sort")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn list_query(&self) -> ListQuery {
        ListQuery {
            text: self.get_text(),
            category: self.get_category(),
            sort: self.get_sort(),
        }
    }
}

/// Link to the blog list keeping only the non-default parameters.
pub fn list_link(query: &ListQuery, page: usize) -> String {
    let mut params: Vec<(&str, String)> = vec![];
    if !query.text.is_empty() {
        params.push(("q", query.text.clone()));
    }
    if let CategoryFilter::Named(ref name) = query.category {
        params.push(("category", name.clone()));
    }
    if query.sort != SortOrder::Newest {
        params.push(("sort", query.sort.label().to_string()));
    }
    if page > 1 {
        params.push(("page", page.to_string()));
    }

    match serde_urlencoded::to_string(&params) {
        Ok(qs) if !qs.is_empty() => format!("/blog?{}", qs),
        _ => "/blog".to_string(),
    }
}
