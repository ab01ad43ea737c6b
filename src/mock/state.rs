//! Shared backend state: records per site and collection, issued tokens and
//! the request log used by tests.

use crate::mock::error::ApiError;
use crate::mock::model::CatalogModel;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub type Record = Map<String, Value>;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MockUser {
    pub id: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub role: String,
}

impl MockUser {
    pub fn new(email: impl Into<String>, password: impl Into<String>, role: impl Into<String>) -> Self {
        MockUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            password: password.into(),
            role: role.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MockConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub users: Vec<MockUser>,
}

impl Default for MockConfig {
    fn default() -> Self {
        MockConfig {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            users: vec![MockUser::new("admin@example.com", "admin", "Admin")],
        }
    }
}

impl MockConfig {
    pub fn with_max_page_size(mut self, max: usize) -> Self {
        self.max_page_size = max.max(1);
        self
    }

    pub fn with_user(mut self, user: MockUser) -> Self {
        self.users.push(user);
        self
    }
}

/// One handled request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestRecord {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
}

/// Records keyed by (site, segment), in insertion order.
#[derive(Debug, Default)]
pub struct Tables {
    tables: HashMap<(String, String), Vec<Record>>,
}

impl Tables {
    pub fn rows(&self, site: &str, segment: &str) -> &[Record] {
        self.tables
            .get(&(site.to_string(), segment.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn rows_mut(&mut self, site: &str, segment: &str) -> &mut Vec<Record> {
        self.tables
            .entry((site.to_string(), segment.to_string()))
            .or_default()
    }

    pub fn find(&self, site: &str, segment: &str, id: &str) -> Option<&Record> {
        self.rows(site, segment).iter().find(|r| record_id(r) == Some(id))
    }
}

pub fn record_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

#[derive(Clone)]
pub struct MockState {
    inner: Arc<Inner>,
}

struct Inner {
    model: CatalogModel,
    config: MockConfig,
    tables: RwLock<Tables>,
    access_tokens: RwLock<HashMap<String, String>>,
    refresh_tokens: RwLock<HashMap<String, String>>,
    refresh_calls: AtomicUsize,
    requests: Mutex<Vec<RequestRecord>>,
}

impl MockState {
    pub fn new(config: MockConfig) -> Self {
        MockState {
            inner: Arc::new(Inner {
                model: CatalogModel::catalog(),
                config,
                tables: RwLock::new(Tables::default()),
                access_tokens: RwLock::new(HashMap::new()),
                refresh_tokens: RwLock::new(HashMap::new()),
                refresh_calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn model(&self) -> &CatalogModel {
        &self.inner.model
    }

    pub fn config(&self) -> &MockConfig {
        &self.inner.config
    }

    pub fn tables(&self) -> Result<RwLockReadGuard<'_, Tables>, ApiError> {
        self.inner
            .tables
            .read()
            .map_err(|_| ApiError::Internal("record store poisoned".into()))
    }

    pub fn tables_mut(&self) -> Result<RwLockWriteGuard<'_, Tables>, ApiError> {
        self.inner
            .tables
            .write()
            .map_err(|_| ApiError::Internal("record store poisoned".into()))
    }

    pub fn user_by_credentials(&self, email: &str, password: &str) -> Option<&MockUser> {
        self.inner
            .config
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email) && u.password == password)
    }

    fn user_by_id(&self, id: &str) -> Option<&MockUser> {
        self.inner.config.users.iter().find(|u| u.id == id)
    }

    /// New access/refresh pair for `user`.
    pub fn issue_tokens(&self, user: &MockUser) -> (String, String) {
        let access = uuid::Uuid::new_v4().simple().to_string();
        let refresh = uuid::Uuid::new_v4().simple().to_string();
        if let Ok(mut tokens) = self.inner.access_tokens.write() {
            tokens.insert(access.clone(), user.id.clone());
        }
        if let Ok(mut tokens) = self.inner.refresh_tokens.write() {
            tokens.insert(refresh.clone(), user.id.clone());
        }
        (access, refresh)
    }

    /// Exchange a refresh token for a new access token. Every call is counted.
    pub fn refresh(&self, refresh: &str) -> Result<String, ApiError> {
        self.inner.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let user_id = self
            .inner
            .refresh_tokens
            .read()
            .ok()
            .and_then(|tokens| tokens.get(refresh).cloned())
            .ok_or_else(|| ApiError::Unauthorized("Token is invalid or expired".into()))?;
        let access = uuid::Uuid::new_v4().simple().to_string();
        self.inner
            .access_tokens
            .write()
            .map_err(|_| ApiError::Internal("token store poisoned".into()))?
            .insert(access.clone(), user_id);
        Ok(access)
    }

    pub fn authenticate(&self, access: Option<&str>) -> Result<&MockUser, ApiError> {
        let Some(access) = access else {
            return Err(ApiError::Unauthorized(
                "Authentication credentials were not provided.".into(),
            ));
        };
        self.inner
            .access_tokens
            .read()
            .ok()
            .and_then(|tokens| tokens.get(access).cloned())
            .and_then(|id| self.user_by_id(&id))
            .ok_or_else(|| ApiError::Unauthorized("Given token not valid for any token type".into()))
    }

    /// Invalidate every issued access token; refresh tokens stay valid.
    pub fn expire_access_tokens(&self) {
        if let Ok(mut tokens) = self.inner.access_tokens.write() {
            tokens.clear();
        }
    }

    /// Invalidate refresh tokens too, so the next refresh fails.
    pub fn revoke_refresh_tokens(&self) {
        if let Ok(mut tokens) = self.inner.refresh_tokens.write() {
            tokens.clear();
        }
    }

    pub fn refresh_calls(&self) -> usize {
        self.inner.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn log_request(&self, record: RequestRecord) {
        if let Ok(mut requests) = self.inner.requests.lock() {
            requests.push(record);
        }
    }

    pub fn requests(&self) -> Vec<RequestRecord> {
        self.inner
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Requests with `method` whose path ends with `suffix`.
    pub fn count_requests(&self, method: &str, suffix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path.ends_with(suffix))
            .count()
    }

    pub fn clear_requests(&self) {
        if let Ok(mut requests) = self.inner.requests.lock() {
            requests.clear();
        }
    }
}

impl Default for MockState {
    fn default() -> Self {
        MockState::new(MockConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_issues_a_working_access_token() {
        let state = MockState::default();
        let user = state.user_by_credentials("admin@example.com", "admin").unwrap().clone();
        let (access, refresh) = state.issue_tokens(&user);
        assert!(state.authenticate(Some(&access)).is_ok());

        state.expire_access_tokens();
        assert!(state.authenticate(Some(&access)).is_err());

        let fresh = state.refresh(&refresh).unwrap();
        assert_eq!(state.authenticate(Some(&fresh)).unwrap().email, "admin@example.com");
        assert_eq!(state.refresh_calls(), 1);
    }

    #[test]
    fn unknown_refresh_token_is_rejected_and_counted() {
        let state = MockState::default();
        assert!(matches!(state.refresh("nope"), Err(ApiError::Unauthorized(_))));
        assert_eq!(state.refresh_calls(), 1);
    }

    #[test]
    fn wrong_password_finds_no_user() {
        let state = MockState::default();
        assert!(state.user_by_credentials("admin@example.com", "wrong").is_none());
        assert!(state.user_by_credentials("ADMIN@example.com", "admin").is_some());
    }
}
