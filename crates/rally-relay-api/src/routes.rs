//! Router construction

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::handlers::{self, AppState};
use crate::request_id::{propagate_request_id, request_span};

/// Allowed CORS origins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: vec!["*".to_string()],
        }
    }
}

impl CorsConfig {
    /// Parse a comma-separated origin list; an empty list means `*`
    pub fn from_list(list: &str) -> Self {
        let origins: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() {
            Self::default()
        } else {
            Self { origins }
        }
    }

    fn allows_any(&self) -> bool {
        self.origins.iter().any(|o| o == "*")
    }

    /// Credentialed CORS; wildcards are served by mirroring the request
    pub fn layer(&self) -> CorsLayer {
        let origin = if self.allows_any() {
            AllowOrigin::mirror_request()
        } else {
            let origins: Vec<HeaderValue> = self
                .origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %o, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(origins)
        };

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    }
}

/// Build the application router
pub fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/api", get(handlers::root))
        .route("/api/", get(handlers::root))
        .route(
            "/api/status",
            post(handlers::create_status_check).get(handlers::list_status_checks),
        )
        .route("/api/ws/publish", post(handlers::publish))
        .route("/api/ws/status", get(handlers::provider_status))
        .route("/api/health", get(handlers::health_check))
        .route("/api/version", get(handlers::version_info))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(middleware::from_fn(propagate_request_id))
        .layer(cors.layer())
        .with_state(state)
}
