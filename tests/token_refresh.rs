mod common;

use catalog_admin::catalog::{BrandPayload, Brands};
use catalog_admin::{
    ApiClient, ClientError, Credentials, MemoryTokenStore, MockConfig, MockServer, NotificationLevel,
    RecordingNotifier, ResourceStore, Session,
};
use common::{start, SITE};
use serde_json::Value;
use std::sync::Arc;

#[tokio::test]
async fn concurrent_rejections_share_one_refresh() {
    let h = start().await;
    let mut brands = ResourceStore::<Brands>::new(h.client.clone());
    brands.create(&BrandPayload::new("Acme")).await.unwrap();
    let state = h.server.state();
    let stale = h.client.tokens().access;
    state.expire_access_tokens();

    let path = h.client.site_path("brands/").unwrap();
    let (a, b) = tokio::join!(
        h.client.get::<Value>(&path, &[]),
        h.client.get::<Value>(&path, &[]),
    );

    assert_eq!(a.unwrap()["count"], Value::from(1));
    assert_eq!(b.unwrap()["count"], Value::from(1));
    assert_eq!(state.refresh_calls(), 1);
    assert!(h.client.tokens().access.is_some());
    assert_ne!(h.client.tokens().access, stale);
}

#[tokio::test]
async fn rejected_mutation_is_replayed_once_after_refresh() {
    let h = start().await;
    let mut brands = ResourceStore::<Brands>::new(h.client.clone());
    let state = h.server.state();
    state.expire_access_tokens();
    state.clear_requests();

    brands.create(&BrandPayload::new("Acme")).await.unwrap();

    assert_eq!(state.count_requests("POST", "/brands/"), 2);
    assert_eq!(state.count_requests("POST", "/auth-tokens/refresh/"), 1);
    assert_eq!(brands.items().len(), 1);
}

#[tokio::test]
async fn failed_refresh_signs_the_session_out() {
    let h = start().await;
    let state = h.server.state();
    state.expire_access_tokens();
    state.revoke_refresh_tokens();

    let path = h.client.site_path("brands/").unwrap();
    let err = h.client.get::<Value>(&path, &[]).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!h.client.is_authenticated());
    assert!(h.client.tokens().refresh.is_none());
    assert_eq!(state.refresh_calls(), 1);
    assert_eq!(h.notifier.messages(NotificationLevel::Info), vec!["Signed out.".to_string()]);
}

#[tokio::test]
async fn wrong_password_is_reported_and_leaves_no_tokens() {
    let server = MockServer::start(MockConfig::default()).await.unwrap();
    let notifier = RecordingNotifier::new();
    let client = ApiClient::new(
        &server.client_config(SITE),
        Arc::new(MemoryTokenStore::default()),
        Arc::new(notifier.clone()),
    )
    .unwrap();
    let mut session = Session::new(client.clone());

    let err = session
        .login(&Credentials::new("admin@example.com", "nope"))
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
    assert!(!session.is_logged_in());
    assert_eq!(
        notifier.messages(NotificationLevel::Negative),
        vec!["No active account found with the given credentials".to_string()]
    );
    assert_eq!(server.state().refresh_calls(), 0);
}

#[tokio::test]
async fn login_loads_the_admin_profile() {
    let server = MockServer::start(MockConfig::default()).await.unwrap();
    let client = ApiClient::from_config(&server.client_config(SITE)).unwrap();
    let mut session = Session::new(client);

    session
        .login(&Credentials::new("admin@example.com", "admin"))
        .await
        .unwrap();

    assert!(session.is_logged_in());
    assert!(session.is_admin());
    assert_eq!(session.profile().map(|p| p.email.as_str()), Some("admin@example.com"));

    session.logout();
    assert!(session.profile().is_none());
}

#[tokio::test]
async fn requests_without_a_site_fail_before_reaching_the_server() {
    let server = MockServer::start(MockConfig::default()).await.unwrap();
    let client = ApiClient::from_config(&catalog_admin::ClientConfig::new(server.base_url())).unwrap();
    let mut brands = ResourceStore::<Brands>::new(client);

    let err = brands.fetch(None).await.unwrap_err();

    assert!(matches!(err, ClientError::Config(_)));
    assert!(server.state().requests().is_empty());
}
