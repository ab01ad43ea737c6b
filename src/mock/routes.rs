//! Route table for the mock backend.

use crate::mock::handlers::{health, login, me, refresh, site_resource, version};
use crate::mock::state::{MockState, RequestRecord};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{any, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

pub const API_PREFIX: &str = "/api/v1";

/// Uploads above this size are rejected before reaching a handler.
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

async fn record_request(State(state): State<MockState>, req: Request, next: Next) -> Response {
    state.log_request(RequestRecord {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        query: req.uri().query().map(str::to_string),
    });
    tracing::debug!(method = %req.method(), path = %req.uri().path(), "request");
    next.run(req).await
}

/// Token, profile and site routes under `/api/v1`, plus `/health` and `/version`.
pub fn router(state: MockState) -> Router {
    let api = Router::new()
        .route("/auth-tokens", post(login))
        .route("/auth-tokens/", post(login))
        .route("/auth-tokens/refresh/", post(refresh))
        .route("/users/me/", get(me))
        .route("/sites/:site/*rest", any(site_resource));

    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .nest(API_PREFIX, api)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(state.clone(), record_request))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
