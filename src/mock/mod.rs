//! In-memory reference backend for the catalog REST API.
//!
//! Serves the same paths, envelopes and error shapes the client expects, keeps
//! records per site in memory and records every request so tests can assert
//! on traffic.

pub mod error;
pub mod handlers;
pub mod model;
pub mod query;
pub mod render;
pub mod routes;
pub mod state;
pub mod validation;

pub use error::{ApiError, FieldErrors};
pub use model::{CatalogModel, CollectionSpec};
pub use routes::{router, API_PREFIX};
pub use state::{MockConfig, MockState, MockUser, RequestRecord};

use crate::config::ClientConfig;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A mock backend bound to an ephemeral local port. The server stops on drop.
pub struct MockServer {
    addr: SocketAddr,
    state: MockState,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(config: MockConfig) -> std::io::Result<Self> {
        Self::bind("127.0.0.1:0", config).await
    }

    pub async fn bind(addr: &str, config: MockConfig) -> std::io::Result<Self> {
        let state = MockState::new(config);
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let app = router(state.clone());
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "mock server stopped");
            }
        });
        tracing::info!(%addr, "mock server listening");
        Ok(MockServer { addr, state, handle })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `http://{addr}/api/v1`
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    pub fn state(&self) -> &MockState {
        &self.state
    }

    pub fn client_config(&self, site_id: &str) -> ClientConfig {
        ClientConfig::new(self.base_url()).with_site(site_id)
    }

    /// Run until the serving task ends.
    pub async fn wait(&mut self) {
        if let Err(e) = (&mut self.handle).await {
            tracing::warn!(error = %e, "mock server task ended");
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
