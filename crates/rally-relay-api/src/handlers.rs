//! API request handlers
//!
//! This module implements the HTTP request handlers for all `/api` endpoints.
//! Status handlers surface storage failures as errors; the publish handler
//! always answers 200 and encodes relay failures in the body.

use axum::{extract::State, Json};
use rally_relay_core::{
    ProviderStatusReport, PublishRequest, PublishResponse, StatusCheck, StatusCheckCreate,
};
use rally_relay_service::ServiceRegistry;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    error::ApiResult,
    extract::AppJson,
    responses::{ComponentHealth, HealthResponse, MessageResponse, VersionInfo},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Service registry
    pub services: Arc<ServiceRegistry>,
}

impl AppState {
    /// Create new application state
    pub fn new(services: ServiceRegistry) -> Self {
        Self {
            services: Arc::new(services),
        }
    }
}

// ============================================================================
// Root
// ============================================================================

/// Liveness greeting
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Hello World"))
}

// ============================================================================
// Status Check Handlers
// ============================================================================

/// Record a status check
#[instrument(skip(state, input))]
pub async fn create_status_check(
    State(state): State<AppState>,
    AppJson(input): AppJson<StatusCheckCreate>,
) -> ApiResult<Json<StatusCheck>> {
    info!("Creating status check for client: {}", input.client_name);

    let check = state.services.status().create(input.client_name).await?;
    Ok(Json(check))
}

/// List recorded status checks
#[instrument(skip(state))]
pub async fn list_status_checks(State(state): State<AppState>) -> ApiResult<Json<Vec<StatusCheck>>> {
    debug!("Listing status checks");

    let checks = state.services.status().list().await?;
    Ok(Json(checks))
}

// ============================================================================
// Pub/Sub Handlers
// ============================================================================

/// Relay a payload to a push-messaging provider
#[instrument(skip_all)]
pub async fn publish(
    State(state): State<AppState>,
    AppJson(request): AppJson<PublishRequest>,
) -> Json<PublishResponse> {
    let outcome = state.services.relay().publish(request).await;
    Json(outcome.into())
}

/// Report provider configuration state
#[instrument(skip(state))]
pub async fn provider_status(State(state): State<AppState>) -> Json<ProviderStatusReport> {
    Json(state.services.relay().status().await)
}

// ============================================================================
// Health & Version Handlers
// ============================================================================

/// Health check endpoint
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> HealthResponse {
    debug!("Health check requested");

    let db_health = match state.services.status().check_store().await {
        Ok(()) => ComponentHealth::healthy(),
        Err(e) => ComponentHealth::unhealthy(format!("Database error: {}", e)),
    };

    HealthResponse::healthy()
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_check("database", db_health)
        .with_check("service", ComponentHealth::healthy())
        .compute_status()
}

/// Get API version information
pub async fn version_info() -> Json<VersionInfo> {
    Json(VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: "v1".to_string(),
    })
}
