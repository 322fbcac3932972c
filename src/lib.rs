//! Harness for the end-to-end tests in `tests/`.
//!
//! Builds the full router over an in-memory SQLite store, with both provider
//! clients pointed at a wiremock server.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use rally_relay_api::{build_router, AppState, CorsConfig};
use rally_relay_db::{SqlStatusStore, StoreOptions};
use rally_relay_service::{ProviderEndpoints, RelayService, ServiceRegistry, StaticCredentials};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::MockServer;

/// Router wired to a fresh store and to `provider_server` for both providers
pub async fn test_app(credentials: StaticCredentials, provider_server: &MockServer) -> Router {
    let store = SqlStatusStore::connect(&StoreOptions::new("sqlite::memory:"))
        .await
        .expect("in-memory store");

    let credentials = Arc::new(credentials);
    let relay = RelayService::new(credentials.clone()).with_endpoints(ProviderEndpoints {
        ably: Some(provider_server.uri()),
        pusher: Some(provider_server.uri()),
    });
    let services = ServiceRegistry::new(Arc::new(store), credentials).with_relay(relay);

    build_router(AppState::new(services), &CorsConfig::default())
}

/// Send one request, returning the status and the JSON body
pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("valid request"))
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    (status, serde_json::from_slice(&bytes).expect("JSON body"))
}
