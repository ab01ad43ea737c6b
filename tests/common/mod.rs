use catalog_admin::{
    ApiClient, Credentials, MemoryTokenStore, MockConfig, MockServer, RecordingNotifier, Session,
};
use std::sync::Arc;

pub const SITE: &str = "site-1";

pub struct Harness {
    pub server: MockServer,
    pub client: ApiClient,
    pub notifier: RecordingNotifier,
}

pub async fn start() -> Harness {
    start_with(MockConfig::default()).await
}

/// Mock backend plus a client already signed in as the default admin.
pub async fn start_with(config: MockConfig) -> Harness {
    let server = MockServer::start(config).await.expect("bind mock server");
    let notifier = RecordingNotifier::new();
    let client = ApiClient::new(
        &server.client_config(SITE),
        Arc::new(MemoryTokenStore::default()),
        Arc::new(notifier.clone()),
    )
    .expect("build client");
    let mut session = Session::new(client.clone());
    session
        .login(&Credentials::new("admin@example.com", "admin"))
        .await
        .expect("login");
    notifier.take();
    Harness {
        server,
        client,
        notifier,
    }
}
