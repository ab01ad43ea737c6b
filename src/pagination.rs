//! List state for one collection: page, page size, sort, search, filters and
//! the server's `next`/`previous` cursors.

use crate::error::ClientError;
use crate::response::PaginatedResponse;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub type QueryParams = Vec<(String, String)>;

/// How a page is requested: by following a server cursor, or by query parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageRequest {
    Cursor(String),
    Params(QueryParams),
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    type Item: Send;

    async fn fetch_page(&self, request: PageRequest) -> Result<PaginatedResponse<Self::Item>, ClientError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl FilterValue {
    /// Query-string form; `None` for an empty text value.
    pub fn to_query(&self) -> Option<String> {
        match self {
            FilterValue::Text(s) if s.is_empty() => None,
            FilterValue::Text(s) => Some(s.clone()),
            FilterValue::Int(n) => Some(n.to_string()),
            FilterValue::Bool(b) => Some(b.to_string()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Int(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Int(n.into())
    }
}

impl From<u32> for FilterValue {
    fn from(n: u32) -> Self {
        FilterValue::Int(n.into())
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationOptions {
    pub default_page_size: u32,
    pub default_sort_by: String,
    pub default_descending: bool,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        PaginationOptions {
            default_page_size: 10,
            default_sort_by: "id".to_string(),
            default_descending: false,
        }
    }
}

impl PaginationOptions {
    pub fn sorted_by(field: &str) -> Self {
        PaginationOptions {
            default_sort_by: field.to_string(),
            ..PaginationOptions::default()
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size;
        self
    }

    pub fn descending(mut self) -> Self {
        self.default_descending = true;
        self
    }
}

/// Pagination descriptor exchanged with a table widget.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TablePagination {
    pub sort_by: Option<String>,
    pub descending: bool,
    pub page: u32,
    pub rows_per_page: u32,
    pub rows_number: u64,
}

pub struct Paginator<F: PageFetcher> {
    fetcher: F,
    options: PaginationOptions,
    current_page: u32,
    page_size: u32,
    total_count: u64,
    sort_by: String,
    descending: bool,
    search: String,
    filters: BTreeMap<String, FilterValue>,
    next: Option<String>,
    previous: Option<String>,
    loading: bool,
}

impl<F: PageFetcher> Paginator<F> {
    pub fn new(fetcher: F, options: PaginationOptions) -> Self {
        Paginator {
            fetcher,
            current_page: 1,
            page_size: options.default_page_size,
            total_count: 0,
            sort_by: options.default_sort_by.clone(),
            descending: options.default_descending,
            search: String::new(),
            filters: BTreeMap::new(),
            next: None,
            previous: None,
            loading: false,
            options,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    pub fn options(&self) -> &PaginationOptions {
        &self.options
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn sort_by(&self) -> &str {
        &self.sort_by
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    pub fn search_query(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    pub fn next_url(&self) -> Option<&str> {
        self.next.as_deref()
    }

    pub fn previous_url(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    pub fn table_pagination(&self) -> TablePagination {
        TablePagination {
            sort_by: Some(self.sort_by.clone()),
            descending: self.descending,
            page: self.current_page,
            rows_per_page: self.page_size,
            rows_number: self.total_count,
        }
    }

    /// Copy a table's descriptor into the list state. Zero or empty values fall back to defaults.
    pub fn apply_table_pagination(&mut self, table: &TablePagination) {
        self.sort_by = table
            .sort_by
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.options.default_sort_by.clone());
        self.descending = table.descending;
        self.current_page = if table.page == 0 { 1 } else { table.page };
        self.page_size = if table.rows_per_page == 0 {
            self.options.default_page_size
        } else {
            table.rows_per_page
        };
    }

    /// Query parameters for the current state: page, page_size, ordering, search, filters.
    pub fn build_params(&self) -> QueryParams {
        let mut params = vec![
            ("page".to_string(), self.current_page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];
        if !self.sort_by.is_empty() {
            let ordering = if self.descending {
                format!("-{}", self.sort_by)
            } else {
                self.sort_by.clone()
            };
            params.push(("ordering".to_string(), ordering));
        }
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }
        for (key, value) in &self.filters {
            if let Some(v) = value.to_query() {
                params.push((key.clone(), v));
            }
        }
        params
    }

    /// Load a page. A cursor URL is followed verbatim; otherwise the built parameters are sent.
    pub async fn fetch_data(&mut self, cursor: Option<&str>) -> Result<Vec<F::Item>, ClientError> {
        let request = match cursor {
            Some(url) => PageRequest::Cursor(url.to_string()),
            None => PageRequest::Params(self.build_params()),
        };
        self.loading = true;
        let result = self.fetcher.fetch_page(request).await;
        self.loading = false;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(error = %e, page = self.current_page, "failed to load page");
                return Err(e);
            }
        };
        self.total_count = page.count;
        self.next = page.next;
        self.previous = page.previous;
        self.reconcile_page_size(page.results.len());
        Ok(page.results)
    }

    /// A short page that still has a successor means the server capped the page size.
    fn reconcile_page_size(&mut self, received: usize) {
        let Ok(received) = u32::try_from(received) else {
            return;
        };
        if self.next.is_some() && received > 0 && received < self.page_size {
            tracing::warn!(
                requested = self.page_size,
                served = received,
                "server capped the page size, adopting it"
            );
            self.page_size = received;
        }
    }

    pub async fn handle_table_request(
        &mut self,
        table: Option<&TablePagination>,
    ) -> Result<Vec<F::Item>, ClientError> {
        if let Some(table) = table {
            self.apply_table_pagination(table);
        }
        self.fetch_data(None).await
    }

    /// `Ok(None)` when there is no next cursor.
    pub async fn go_to_next_page(&mut self) -> Result<Option<Vec<F::Item>>, ClientError> {
        let Some(url) = self.next.clone() else {
            return Ok(None);
        };
        self.current_page += 1;
        self.fetch_data(Some(&url)).await.map(Some)
    }

    /// `Ok(None)` when there is no previous cursor.
    pub async fn go_to_previous_page(&mut self) -> Result<Option<Vec<F::Item>>, ClientError> {
        let Some(url) = self.previous.clone() else {
            return Ok(None);
        };
        self.current_page = self.current_page.saturating_sub(1).max(1);
        self.fetch_data(Some(&url)).await.map(Some)
    }

    pub async fn go_to_first_page(&mut self) -> Result<Vec<F::Item>, ClientError> {
        self.current_page = 1;
        self.fetch_data(None).await
    }

    pub async fn go_to_last_page(&mut self) -> Result<Vec<F::Item>, ClientError> {
        self.current_page = u32::try_from(self.total_pages()).unwrap_or(u32::MAX).max(1);
        self.fetch_data(None).await
    }

    /// `Ok(None)` when `page` is outside `1..=total_pages`.
    pub async fn go_to_page(&mut self, page: u32) -> Result<Option<Vec<F::Item>>, ClientError> {
        if page < 1 || u64::from(page) > self.total_pages() {
            return Ok(None);
        }
        self.current_page = page;
        self.fetch_data(None).await.map(Some)
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
        self.current_page = 1;
    }

    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.filters.insert(key.into(), value.into());
        self.current_page = 1;
    }

    pub fn remove_filter(&mut self, key: &str) {
        self.filters.remove(key);
        self.current_page = 1;
    }

    /// Drops every filter and the search text.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.search.clear();
        self.current_page = 1;
    }

    pub fn set_sort(&mut self, field: impl Into<String>, descending: bool) {
        self.sort_by = field.into();
        self.descending = descending;
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
        self.page_size = self.options.default_page_size;
        self.sort_by = self.options.default_sort_by.clone();
        self.descending = self.options.default_descending;
        self.total_count = 0;
        self.next = None;
        self.previous = None;
        self.clear_filters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Serves `total` integers, honouring `page`/`page_size` up to `max_page_size`.
    #[derive(Clone)]
    struct StubFetcher {
        total: u64,
        max_page_size: u32,
        requests: Arc<Mutex<Vec<PageRequest>>>,
        fail: bool,
    }

    impl StubFetcher {
        fn new(total: u64) -> Self {
            StubFetcher {
                total,
                max_page_size: 1000,
                requests: Arc::default(),
                fail: false,
            }
        }

        fn requests(&self) -> Vec<PageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    fn param(params: &QueryParams, key: &str) -> Option<String> {
        params.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        type Item = u64;

        async fn fetch_page(&self, request: PageRequest) -> Result<PaginatedResponse<u64>, ClientError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(ClientError::Validation("boom".into()));
            }
            let (page, size) = match &request {
                PageRequest::Params(p) => (
                    param(p, "page").unwrap().parse::<u64>().unwrap(),
                    param(p, "page_size").unwrap().parse::<u32>().unwrap(),
                ),
                PageRequest::Cursor(url) => {
                    let page = url.rsplit('=').next().unwrap().parse::<u64>().unwrap();
                    (page, 10)
                }
            };
            let size = u64::from(size.min(self.max_page_size));
            let start = (page - 1) * size;
            let end = (start + size).min(self.total);
            Ok(PaginatedResponse {
                count: self.total,
                next: (end < self.total).then(|| format!("http://x/items/?page={}", page + 1)),
                previous: (page > 1).then(|| format!("http://x/items/?page={}", page - 1)),
                results: (start..end).collect(),
            })
        }
    }

    fn paginator(total: u64) -> Paginator<StubFetcher> {
        Paginator::new(StubFetcher::new(total), PaginationOptions::default())
    }

    #[test]
    fn total_pages_rounds_up() {
        for (count, size, pages) in [(0u64, 10u32, 0u64), (1, 10, 1), (10, 10, 1), (11, 10, 2), (95, 7, 14)] {
            let mut p = paginator(0);
            p.total_count = count;
            p.page_size = size;
            assert_eq!(p.total_pages(), pages, "count={} size={}", count, size);
        }
    }

    #[test]
    fn params_encode_sort_search_and_non_empty_filters() {
        let mut p = paginator(0);
        p.set_sort("name", true);
        p.set_search("acme");
        p.set_filter("is_published", true);
        p.set_filter("brand", "");
        p.set_filter("order", 3);
        assert_eq!(
            p.build_params(),
            vec![
                ("page".to_string(), "1".to_string()),
                ("page_size".to_string(), "10".to_string()),
                ("ordering".to_string(), "-name".to_string()),
                ("search".to_string(), "acme".to_string()),
                ("is_published".to_string(), "true".to_string()),
                ("order".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn query_mutations_reset_to_first_page() {
        let mut p = paginator(0);
        p.current_page = 4;
        p.set_search("x");
        assert_eq!(p.current_page(), 1);
        p.current_page = 4;
        p.set_filter("k", "v");
        assert_eq!(p.current_page(), 1);
        p.current_page = 4;
        p.remove_filter("k");
        assert_eq!(p.current_page(), 1);
        p.current_page = 4;
        p.clear_filters();
        assert_eq!(p.current_page(), 1);
        assert!(p.search_query().is_empty());
    }

    #[tokio::test]
    async fn table_request_matches_manual_state() {
        let table = TablePagination {
            sort_by: Some("name".into()),
            descending: true,
            page: 2,
            rows_per_page: 5,
            rows_number: 0,
        };
        let mut via_table = paginator(30);
        via_table.handle_table_request(Some(&table)).await.unwrap();

        let mut manual = paginator(30);
        manual.set_sort("name", true);
        manual.page_size = 5;
        manual.current_page = 2;
        manual.fetch_data(None).await.unwrap();

        assert_eq!(via_table.fetcher().requests(), manual.fetcher().requests());
    }

    #[test]
    fn table_defaults_fill_empty_values() {
        let mut p = paginator(0);
        p.apply_table_pagination(&TablePagination::default());
        assert_eq!(p.sort_by(), "id");
        assert_eq!(p.current_page(), 1);
        assert_eq!(p.page_size(), 10);
    }

    #[tokio::test]
    async fn fetch_updates_count_and_cursors() {
        let mut p = paginator(25);
        let items = p.fetch_data(None).await.unwrap();
        assert_eq!(items, (0..10).collect::<Vec<_>>());
        assert_eq!(p.total_count(), 25);
        assert_eq!(p.total_pages(), 3);
        assert!(p.has_next());
        assert!(!p.has_previous());
        assert!(!p.is_loading());
    }

    #[tokio::test]
    async fn cursor_navigation_follows_urls() {
        let mut p = paginator(25);
        p.fetch_data(None).await.unwrap();
        let second = p.go_to_next_page().await.unwrap().unwrap();
        assert_eq!(second[0], 10);
        assert_eq!(p.current_page(), 2);
        assert_eq!(
            p.fetcher().requests().last(),
            Some(&PageRequest::Cursor("http://x/items/?page=2".into()))
        );

        p.go_to_previous_page().await.unwrap().unwrap();
        assert_eq!(p.current_page(), 1);
        assert!(p.go_to_previous_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn next_without_cursor_is_a_no_op() {
        let mut p = paginator(5);
        p.fetch_data(None).await.unwrap();
        assert!(p.go_to_next_page().await.unwrap().is_none());
        assert_eq!(p.fetcher().requests().len(), 1);
    }

    #[tokio::test]
    async fn go_to_page_outside_range_does_not_fetch() {
        let mut p = paginator(25);
        p.fetch_data(None).await.unwrap();
        assert!(p.go_to_page(0).await.unwrap().is_none());
        assert!(p.go_to_page(4).await.unwrap().is_none());
        assert_eq!(p.fetcher().requests().len(), 1);

        let third = p.go_to_page(3).await.unwrap().unwrap();
        assert_eq!(third, vec![20, 21, 22, 23, 24]);
    }

    #[tokio::test]
    async fn last_page_of_empty_collection_is_page_one() {
        let mut p = paginator(0);
        p.go_to_last_page().await.unwrap();
        assert_eq!(p.current_page(), 1);

        let mut p = paginator(25);
        p.fetch_data(None).await.unwrap();
        p.go_to_last_page().await.unwrap();
        assert_eq!(p.current_page(), 3);
    }

    #[tokio::test]
    async fn capped_page_size_is_adopted() {
        let mut fetcher = StubFetcher::new(250);
        fetcher.max_page_size = 100;
        let mut p = Paginator::new(fetcher, PaginationOptions::default().with_page_size(500));
        let items = p.fetch_data(None).await.unwrap();
        assert_eq!(items.len(), 100);
        assert_eq!(p.page_size(), 100);
        assert_eq!(p.total_pages(), 3);
    }

    #[tokio::test]
    async fn failure_propagates_and_keeps_state() {
        let mut fetcher = StubFetcher::new(25);
        fetcher.fail = true;
        let mut p = Paginator::new(fetcher, PaginationOptions::default());
        assert!(p.fetch_data(None).await.is_err());
        assert_eq!(p.total_count(), 0);
        assert!(!p.is_loading());
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let mut p = Paginator::new(StubFetcher::new(25), PaginationOptions::sorted_by("name"));
        p.fetch_data(None).await.unwrap();
        p.set_sort("value", true);
        p.set_filter("a", 1);
        p.page_size = 3;
        p.reset();
        assert_eq!(p.sort_by(), "name");
        assert!(!p.is_descending());
        assert_eq!(p.page_size(), 10);
        assert_eq!(p.total_count(), 0);
        assert!(p.filters().is_empty());
        assert!(!p.has_next());
    }
}
