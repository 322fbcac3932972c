//! Ably Adapter
//!
//! Publishes channel messages through the Ably REST API. Payloads are sent
//! as JSON text with `encoding: "json"` so subscribers receive the original
//! object.

use async_trait::async_trait;
use rally_relay_core::Provider;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{rejection, ProviderError, ProviderResult, PushPublisher};
use crate::credentials::{CredentialSource, ABLY_KEY};

/// Default Ably REST endpoint
pub const ABLY_REST_URL: &str = "https://rest.ably.io";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct AblyMessage<'a> {
    name: &'a str,
    data: String,
    encoding: &'static str,
}

/// Ably REST client
pub struct AblyClient {
    http: reqwest::Client,
    base_url: String,
    key_name: String,
    key_secret: SecretString,
}

impl std::fmt::Debug for AblyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AblyClient")
            .field("base_url", &self.base_url)
            .field("key_name", &self.key_name)
            .finish_non_exhaustive()
    }
}

impl AblyClient {
    /// Build a client from an API key of the form `<key name>:<key secret>`
    pub fn new(api_key: &str) -> ProviderResult<Self> {
        let (key_name, key_secret) = api_key
            .split_once(':')
            .filter(|(name, secret)| !name.is_empty() && !secret.is_empty())
            .ok_or_else(|| ProviderError::InvalidCredentials {
                provider: Provider::Ably,
                reason: "key must have the form <key name>:<key secret>".to_string(),
            })?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| ProviderError::Transport {
                provider: Provider::Ably,
                source,
            })?;

        Ok(Self {
            http,
            base_url: ABLY_REST_URL.to_string(),
            key_name: key_name.to_string(),
            key_secret: SecretString::new(key_secret.to_string()),
        })
    }

    /// Build a client from `ABLY_KEY`
    pub fn from_credentials(credentials: &dyn CredentialSource) -> ProviderResult<Self> {
        let key = credentials
            .get(ABLY_KEY)
            .ok_or(ProviderError::NotConfigured(Provider::Ably))?;
        Self::new(&key)
    }

    /// Point the client at a different REST host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Public part of the API key
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    fn messages_url(&self, channel: &str) -> String {
        format!(
            "{}/channels/{}/messages",
            self.base_url,
            urlencoding::encode(channel)
        )
    }
}

#[async_trait]
impl PushPublisher for AblyClient {
    #[instrument(skip(self, data), fields(provider = "ably"))]
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        data: &serde_json::Map<String, serde_json::Value>,
    ) -> ProviderResult<()> {
        let message = AblyMessage {
            name: event,
            data: serde_json::to_string(data)?,
            encoding: "json",
        };

        let response = self
            .http
            .post(self.messages_url(channel))
            .basic_auth(&self.key_name, Some(self.key_secret.expose_secret()))
            .json(&message)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: Provider::Ably,
                source: source.without_url(),
            })?;

        if !response.status().is_success() {
            return Err(rejection(Provider::Ably, response).await);
        }

        debug!(status = response.status().as_u16(), "Ably accepted message");
        Ok(())
    }
}
