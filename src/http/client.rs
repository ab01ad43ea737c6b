//! Authenticated REST transport.
//!
//! Every request carries the current bearer token. A 401 on any call other than
//! the refresh endpoint goes through a single refresh gate: the first caller
//! exchanges the refresh token, callers queued behind it reuse the new access
//! token, and each rejected request is replayed exactly once. A failed refresh
//! signs the session out.

use crate::auth::{FileTokenStore, MemoryTokenStore, TokenPair, TokenStore};
use crate::config::{ClientConfig, SITE_ID_ENV};
use crate::error::{ClientError, ConfigError, ErrorPayload};
use crate::http::body::{Payload, RequestBody};
use crate::notify::{Notification, Notifier, TracingNotifier};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub const LOGIN_PATH: &str = "/auth-tokens";
pub const REFRESH_PATH: &str = "/auth-tokens/refresh/";
pub const PROFILE_PATH: &str = "/users/me/";

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    site_id: Option<String>,
    default_page_size: u32,
    tokens: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("site_id", &self.inner.site_id)
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(ApiClient {
            inner: Arc::new(Inner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                site_id: config.site_id.clone(),
                default_page_size: config.default_page_size,
                tokens,
                notifier,
                refresh_gate: tokio::sync::Mutex::new(()),
            }),
        })
    }

    /// Client with the token store implied by config and log-only notifications.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let tokens: Arc<dyn TokenStore> = match &config.token_file {
            Some(path) => Arc::new(FileTokenStore::open(path)),
            None => Arc::new(MemoryTokenStore::default()),
        };
        Self::new(config, tokens, Arc::new(TracingNotifier))
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn default_page_size(&self) -> u32 {
        self.inner.default_page_size
    }

    pub fn site(&self) -> Result<&str, ConfigError> {
        self.inner
            .site_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSite(SITE_ID_ENV))
    }

    /// `/sites/{site}/{rest}`
    pub fn site_path(&self, rest: &str) -> Result<String, ClientError> {
        Ok(format!("/sites/{}/{}", self.site()?, rest.trim_start_matches('/')))
    }

    pub fn notify(&self, notification: Notification) {
        self.inner.notifier.notify(notification);
    }

    pub fn tokens(&self) -> TokenPair {
        self.inner.tokens.load()
    }

    pub fn set_tokens(&self, tokens: &TokenPair) {
        self.inner.tokens.save(tokens);
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens().access.is_some()
    }

    /// Drop both tokens.
    pub fn logout(&self) {
        self.inner.tokens.clear();
        self.notify(Notification::info("Signed out."));
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ClientError> {
        let response = self.execute(Method::GET, path, query, &RequestBody::Empty).await?;
        Ok(response.json().await?)
    }

    /// GET a server-supplied cursor URL verbatim.
    pub async fn get_url<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        self.get(url, &[]).await
    }

    pub async fn post<T, P>(&self, path: &str, payload: &P) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        P: Payload + ?Sized,
    {
        self.send_json(Method::POST, path, payload).await
    }

    pub async fn put<T, P>(&self, path: &str, payload: &P) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        P: Payload + ?Sized,
    {
        self.send_json(Method::PUT, path, payload).await
    }

    pub async fn patch<T, P>(&self, path: &str, payload: &P) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        P: Payload + ?Sized,
    {
        self.send_json(Method::PATCH, path, payload).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.execute(Method::DELETE, path, &[], &RequestBody::Empty).await?;
        Ok(())
    }

    /// POST without credentials and without the refresh cycle (login).
    pub async fn post_anonymous<T, P>(&self, path: &str, payload: &P) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        P: Payload + ?Sized,
    {
        let body = RequestBody::from_payload(payload)?;
        let response = self.dispatch(Method::POST, path, &[], &body, None).await?;
        Ok(check(response).await?.json().await?)
    }

    /// Exchange the refresh token for a new access token.
    pub async fn refresh_access_token(&self) -> Result<String, ClientError> {
        let _gate = self.inner.refresh_gate.lock().await;
        let result = self.refresh_locked().await;
        if let Err(e) = &result {
            if e.is_unauthorized() {
                self.force_logout(e);
            }
        }
        result
    }

    async fn send_json<T, P>(&self, method: Method, path: &str, payload: &P) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        P: Payload + ?Sized,
    {
        let body = RequestBody::from_payload(payload)?;
        let response = self.execute(method, path, &[], &body).await?;
        Ok(response.json().await?)
    }

    async fn execute(
        &self,
        method: Method,
        target: &str,
        query: &[(String, String)],
        body: &RequestBody,
    ) -> Result<Response, ClientError> {
        let stale = self.inner.tokens.load().access;
        let response = self
            .dispatch(method.clone(), target, query, body, stale.as_deref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check(response).await;
        }
        if target.contains(REFRESH_PATH) {
            let err = check(response).await.err().unwrap_or(ClientError::Unauthorized);
            self.force_logout(&err);
            return Err(err);
        }

        tracing::debug!(%method, target, "access token rejected");
        let fresh = self.refresh_after_rejection(stale.as_deref()).await?;
        let replayed = self.dispatch(method, target, query, body, Some(&fresh)).await?;
        check(replayed).await
    }

    async fn refresh_after_rejection(&self, stale: Option<&str>) -> Result<String, ClientError> {
        let _gate = self.inner.refresh_gate.lock().await;
        let current = self.inner.tokens.load();
        match current.access {
            Some(access) if Some(access.as_str()) != stale => {
                tracing::debug!("access token already refreshed by a concurrent request");
                return Ok(access);
            }
            None if current.refresh.is_none() => return Err(ClientError::Unauthorized),
            _ => {}
        }
        match self.refresh_locked().await {
            Ok(access) => Ok(access),
            Err(e) => {
                self.force_logout(&e);
                Err(ClientError::Unauthorized)
            }
        }
    }

    /// Caller must hold the refresh gate.
    async fn refresh_locked(&self) -> Result<String, ClientError> {
        let mut tokens = self.inner.tokens.load();
        let Some(refresh) = tokens.refresh.clone() else {
            return Err(ClientError::Unauthorized);
        };
        let body = RequestBody::Json(serde_json::json!({ "refresh": refresh }));
        let response = self.dispatch(Method::POST, REFRESH_PATH, &[], &body, None).await?;
        let refreshed: RefreshResponse = check(response).await?.json().await?;

        tokens.access = Some(refreshed.access.clone());
        if let Some(rotated) = refreshed.refresh {
            tokens.refresh = Some(rotated);
        }
        self.inner.tokens.save(&tokens);
        tracing::info!("access token refreshed");
        Ok(refreshed.access)
    }

    fn force_logout(&self, reason: &ClientError) {
        tracing::warn!(error = %reason, "token refresh failed, signing out");
        self.logout();
    }

    async fn dispatch(
        &self,
        method: Method,
        target: &str,
        query: &[(String, String)],
        body: &RequestBody,
        bearer: Option<&str>,
    ) -> Result<Response, ClientError> {
        let url = self.resolve(target);
        tracing::debug!(%method, %url, params = ?query, "request");
        let mut request = self.inner.http.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(value),
            RequestBody::Multipart { .. } => match body.to_form()? {
                Some(form) => request.multipart(form),
                None => request,
            },
        };
        Ok(request.send().await?)
    }

    fn resolve(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            format!("{}/{}", self.inner.base_url, target.trim_start_matches('/'))
        }
    }
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status,
        body: ErrorPayload::from_text(text),
    })
}
