//! Thin adapter modules for the push-messaging providers
//!
//! Each adapter speaks its provider's REST API directly:
//! - Ably: channel message publish with basic auth
//! - Pusher: signed event trigger
//!
//! Both implement [`PushPublisher`], the seam the relay service publishes through.

pub mod ably;
pub mod pusher;

use async_trait::async_trait;
use rally_relay_core::Provider;
use thiserror::Error;

pub use ably::{AblyClient, ABLY_REST_URL};
pub use pusher::PusherClient;

/// Errors from provider adapters
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{0} not configured")]
    NotConfigured(Provider),

    #[error("Invalid {provider} credentials: {reason}")]
    InvalidCredentials { provider: Provider, reason: String },

    #[error("Invalid channel name: {0}")]
    InvalidChannel(String),

    #[error("Invalid event name: {0}")]
    InvalidEvent(String),

    #[error("Too much data ({size} characters, limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Failed to encode payload: {0}")]
    Encoding(#[from] serde_json::Error),

    /// `source` has its URL stripped; Pusher URLs carry request signatures
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} rejected the request ({status}): {message}")]
    Rejected {
        provider: Provider,
        status: u16,
        message: String,
    },
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A client able to push one event onto one channel
#[async_trait]
pub trait PushPublisher: Send + Sync {
    /// Publish `data` as event `event` on `channel`
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        data: &serde_json::Map<String, serde_json::Value>,
    ) -> ProviderResult<()>;
}

/// Read a non-2xx response into a [`ProviderError::Rejected`]
pub(crate) async fn rejection(provider: Provider, response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    // Ably wraps errors as {"error": {"message": ...}}
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);

    ProviderError::Rejected {
        provider,
        status,
        message,
    }
}
