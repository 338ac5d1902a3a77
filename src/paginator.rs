pub struct Paginator<'a, T> {
    items: &'a [T],
    page_size: usize,
    page_count: usize,
}

impl<'a, T> Paginator<'a, T> {
    pub fn from(items: &'a [T], page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let page_count = items.len().div_ceil(page_size);

        Paginator {
            items,
            page_size,
            page_count,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Items of the 1-based `page`. Pages outside `1..=page_count` are empty.
    pub fn get_page(&self, page: usize) -> &'a [T] {
        if page == 0 || page > self.page_count {
            return &[];
        }

        let start = (page - 1) * self.page_size;
        let end = (start + self.page_size).min(self.items.len());
        &self.items[start..end]
    }
}
