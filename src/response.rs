//! List envelope shared by the client and the mock backend.

use serde::{Deserialize, Serialize};

/// One page of a collection: `{ count, next, previous, results }`.
///
/// `next` and `previous` are opaque absolute URLs for the adjacent pages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    pub fn empty() -> Self {
        PaginatedResponse {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }

    /// Single page holding everything.
    pub fn complete(results: Vec<T>) -> Self {
        PaginatedResponse {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PaginatedResponse<U> {
        PaginatedResponse {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}
