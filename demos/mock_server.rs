//! Standalone mock backend for manual testing against a UI or curl.
//!
//! Run: `cargo run --example mock_server`
//! Sign in with `admin@example.com` / `admin`; every site id is accepted.

use catalog_admin::mock::{router, MockConfig, MockState, MockUser};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("catalog_admin=debug".parse()?))
        .init();

    let addr = std::env::var("MOCK_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".into());
    let mut config = MockConfig::default();
    if let Ok(max) = std::env::var("MOCK_MAX_PAGE_SIZE") {
        config = config.with_max_page_size(max.parse()?);
    }
    config = config.with_user(MockUser::new("editor@example.com", "editor", "Editor"));

    let app = router(MockState::new(config));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{}/api/v1", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
