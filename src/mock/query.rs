//! List query engine: exact-match filters, search, ordering and page slicing.

use crate::mock::error::ApiError;
use crate::mock::model::CollectionSpec;
use crate::mock::state::{MockConfig, Record};
use reqwest::Url;
use serde_json::Value;
use std::cmp::Ordering;

const RESERVED: &[&str] = &["page", "page_size", "ordering", "search"];

#[derive(Clone, Debug, PartialEq)]
pub struct ListQuery {
    pub page: usize,
    pub page_size: usize,
    pub ordering: Vec<(String, bool)>,
    pub search: Option<String>,
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    /// Read `page`, `page_size` (clamped), `ordering`, `search` and filters on known fields.
    pub fn parse(params: &[(String, String)], spec: &CollectionSpec, config: &MockConfig) -> Result<Self, ApiError> {
        let mut query = ListQuery {
            page: 1,
            page_size: config.default_page_size.min(config.max_page_size),
            ordering: parse_ordering(spec.ordering),
            search: None,
            filters: Vec::new(),
        };
        for (key, value) in params {
            match key.as_str() {
                "page" => {
                    query.page = value.parse().map_err(|_| ApiError::InvalidPage)?;
                }
                "page_size" => {
                    if let Ok(size) = value.parse::<usize>() {
                        if size > 0 {
                            query.page_size = size.min(config.max_page_size);
                        }
                    }
                }
                "ordering" if !value.trim().is_empty() => query.ordering = parse_ordering(value),
                "search" if !value.trim().is_empty() => query.search = Some(value.trim().to_lowercase()),
                other if !RESERVED.contains(&other) && spec.is_filterable(other) => {
                    query.filters.push((key.clone(), value.clone()));
                }
                _ => {}
            }
        }
        Ok(query)
    }
}

fn parse_ordering(value: &str) -> Vec<(String, bool)> {
    value
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| match f.strip_prefix('-') {
            Some(field) => (field.to_string(), true),
            None => (f.to_string(), false),
        })
        .collect()
}

/// One slice of a filtered, ordered collection.
#[derive(Debug)]
pub struct ListPage<'a> {
    pub count: usize,
    pub rows: Vec<&'a Record>,
    pub next_page: Option<usize>,
    pub previous_page: Option<usize>,
}

pub fn run<'a>(spec: &CollectionSpec, rows: &'a [Record], query: &ListQuery) -> Result<ListPage<'a>, ApiError> {
    let mut matched: Vec<&Record> = rows
        .iter()
        .filter(|r| query.filters.iter().all(|(k, v)| matches_filter(r.get(k), v)))
        .filter(|r| match &query.search {
            Some(term) => matches_search(spec, r, term),
            None => true,
        })
        .collect();
    matched.sort_by(|a, b| compare_records(a, b, &query.ordering));

    let count = matched.len();
    let pages = count.div_ceil(query.page_size).max(1);
    if query.page < 1 || query.page > pages {
        return Err(ApiError::InvalidPage);
    }
    let start = (query.page - 1) * query.page_size;
    let rows = matched.into_iter().skip(start).take(query.page_size).collect();
    Ok(ListPage {
        count,
        rows,
        next_page: (query.page < pages).then_some(query.page + 1),
        previous_page: (query.page > 1).then_some(query.page - 1),
    })
}

/// Sort by an `ordering` expression such as `order,-name`.
pub fn order_rows(rows: &mut [&Record], ordering: &str) {
    let ordering = parse_ordering(ordering);
    rows.sort_by(|a, b| compare_records(a, b, &ordering));
}

fn matches_filter(value: Option<&Value>, wanted: &str) -> bool {
    match value.unwrap_or(&Value::Null) {
        Value::Null => wanted.is_empty() || wanted.eq_ignore_ascii_case("null"),
        Value::Bool(b) => match wanted.to_ascii_lowercase().as_str() {
            "true" | "1" => *b,
            "false" | "0" => !*b,
            _ => false,
        },
        Value::Number(n) => n.to_string() == wanted,
        Value::String(s) => s == wanted,
        Value::Array(items) => items.iter().any(|item| matches_filter(Some(item), wanted)),
        Value::Object(map) => map.get("id").and_then(Value::as_str) == Some(wanted),
    }
}

fn matches_search(spec: &CollectionSpec, record: &Record, term: &str) -> bool {
    spec.search_fields.iter().any(|field| {
        record
            .get(*field)
            .and_then(Value::as_str)
            .is_some_and(|s| s.to_lowercase().contains(term))
    })
}

fn compare_records(a: &Record, b: &Record, ordering: &[(String, bool)]) -> Ordering {
    for (field, descending) in ordering {
        let ord = compare_values(a.get(field), b.get(field));
        let ord = if *descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Absolute URL of `page` for the same query. Page 1 drops the `page` parameter.
pub fn page_url(base: &str, params: &[(String, String)], page: usize) -> Result<String, ApiError> {
    let mut url = Url::parse(base).map_err(|e| ApiError::Internal(format!("bad base url {}: {}", base, e)))?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in params.iter().filter(|(k, _)| k != "page") {
            pairs.append_pair(key, value);
        }
        if page > 1 {
            pairs.append_pair("page", &page.to_string());
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::model::CatalogModel;
    use serde_json::json;

    fn rows(values: Value) -> Vec<Record> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn ids<'a>(page: &ListPage<'a>) -> Vec<&'a str> {
        page.rows.iter().map(|r| r["id"].as_str().unwrap()).collect()
    }

    fn brands() -> Vec<Record> {
        rows(json!([
            {"id": "1", "name": "zeta", "slug": "zeta", "is_published": true},
            {"id": "2", "name": "Alpha", "slug": "alpha", "is_published": false},
            {"id": "3", "name": "beta", "slug": "beta-x", "is_published": true},
        ]))
    }

    #[test]
    fn default_page_size_respects_the_cap() {
        let model = CatalogModel::catalog();
        let spec = model.get("brands").unwrap();
        let config = MockConfig::default().with_max_page_size(2);
        let query = ListQuery::parse(&[], spec, &config).unwrap();
        assert_eq!(query.page_size, 2);
        let data = brands();
        let page = run(spec, &data, &query).unwrap();
        assert_eq!(page.rows.len(), 2);
    }

    #[test]
    fn default_ordering_is_case_insensitive_and_reversible() {
        let model = CatalogModel::catalog();
        let spec = model.get("brands").unwrap();
        let config = MockConfig::default();
        let data = brands();
        let query = ListQuery::parse(&[], spec, &config).unwrap();
        assert_eq!(ids(&run(spec, &data, &query).unwrap()), vec!["2", "3", "1"]);
        let query = ListQuery::parse(&params(&[("ordering", "-name")]), spec, &config).unwrap();
        assert_eq!(ids(&run(spec, &data, &query).unwrap()), vec!["1", "3", "2"]);
    }

    #[test]
    fn filters_and_search_combine() {
        let model = CatalogModel::catalog();
        let spec = model.get("brands").unwrap();
        let config = MockConfig::default();
        let data = brands();
        let query = ListQuery::parse(
            &params(&[("is_published", "true"), ("search", "ET"), ("unknown", "x")]),
            spec,
            &config,
        )
        .unwrap();
        assert_eq!(query.filters.len(), 1);
        assert_eq!(ids(&run(spec, &data, &query).unwrap()), vec!["3", "1"]);
    }

    #[test]
    fn pages_are_sliced_and_bounded() {
        let model = CatalogModel::catalog();
        let spec = model.get("brands").unwrap();
        let config = MockConfig::default().with_max_page_size(2);
        let data = brands();

        let query = ListQuery::parse(&params(&[("page_size", "50")]), spec, &config).unwrap();
        assert_eq!(query.page_size, 2);
        let page = run(spec, &data, &query).unwrap();
        assert_eq!((page.count, page.rows.len(), page.next_page, page.previous_page), (3, 2, Some(2), None));

        let query = ListQuery::parse(&params(&[("page_size", "2"), ("page", "2")]), spec, &config).unwrap();
        let page = run(spec, &data, &query).unwrap();
        assert_eq!((page.rows.len(), page.next_page, page.previous_page), (1, None, Some(1)));

        let query = ListQuery::parse(&params(&[("page", "3"), ("page_size", "2")]), spec, &config).unwrap();
        assert!(matches!(run(spec, &data, &query), Err(ApiError::InvalidPage)));
        assert!(matches!(
            ListQuery::parse(&params(&[("page", "x")]), spec, &config),
            Err(ApiError::InvalidPage)
        ));
    }

    #[test]
    fn empty_collection_has_one_empty_page() {
        let model = CatalogModel::catalog();
        let spec = model.get("sizes").unwrap();
        let query = ListQuery::parse(&params(&[("search", "XXL")]), spec, &MockConfig::default()).unwrap();
        let page = run(spec, &[], &query).unwrap();
        assert_eq!(page.count, 0);
        assert!(page.rows.is_empty());
    }

    #[test]
    fn page_urls_keep_other_parameters() {
        let base = "http://127.0.0.1:8000/api/v1/sites/s1/brands/";
        let query = params(&[("page", "2"), ("search", "a b"), ("ordering", "-name")]);
        assert_eq!(
            page_url(base, &query, 3).unwrap(),
            "http://127.0.0.1:8000/api/v1/sites/s1/brands/?search=a+b&ordering=-name&page=3"
        );
        assert_eq!(
            page_url(base, &params(&[("page", "2")]), 1).unwrap(),
            "http://127.0.0.1:8000/api/v1/sites/s1/brands/"
        );
    }
}
