//! Rally Relay HTTP API
//!
//! axum handlers and router for the `/api` surface:
//! status checks, pub/sub publishing, provider status, health and version.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod request_id;
pub mod responses;
pub mod routes;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::AppState;
pub use request_id::{RequestId, HEADER_REQUEST_ID};
pub use routes::{build_router, CorsConfig};
