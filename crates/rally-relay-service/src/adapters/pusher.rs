//! Pusher Adapter
//!
//! Triggers events through the Pusher Channels HTTP API. Every request is
//! signed (auth version 1.0): the query carries the app key, a timestamp and
//! the body's MD5, and `auth_signature` is an HMAC-SHA256 of
//! `METHOD\nPATH\nQUERY` keyed with the app secret.
//!
//! Channel names, event names and payload size are checked before any
//! request is sent.

use async_trait::async_trait;
use md5::{Digest, Md5};
use rally_relay_core::Provider;
use ring::hmac;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument};

use super::{rejection, ProviderError, ProviderResult, PushPublisher};
use crate::credentials::{
    CredentialSource, PUSHER_APP_ID, PUSHER_CLUSTER, PUSHER_KEY, PUSHER_SECRET,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const AUTH_VERSION: &str = "1.0";
const MAX_NAME_LEN: usize = 200;
const MAX_DATA_LEN: usize = 10240;

#[derive(Serialize)]
struct TriggerBody<'a> {
    name: &'a str,
    channels: [&'a str; 1],
    data: String,
}

/// Pusher Channels HTTP client
pub struct PusherClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    key: String,
    secret: SecretString,
}

impl std::fmt::Debug for PusherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PusherClient")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl PusherClient {
    /// Build a client for an app on `cluster`, over TLS
    pub fn new(app_id: &str, key: &str, secret: &str, cluster: &str) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| ProviderError::Transport {
                provider: Provider::Pusher,
                source,
            })?;

        Ok(Self {
            http,
            base_url: format!("https://api-{cluster}.pusher.com"),
            app_id: app_id.to_string(),
            key: key.to_string(),
            secret: SecretString::new(secret.to_string()),
        })
    }

    /// Build a client from the four `PUSHER_*` credentials; all are required
    pub fn from_credentials(credentials: &dyn CredentialSource) -> ProviderResult<Self> {
        let required = |name: &str| {
            credentials
                .get(name)
                .ok_or(ProviderError::NotConfigured(Provider::Pusher))
        };

        let app_id = required(PUSHER_APP_ID)?;
        let key = required(PUSHER_KEY)?;
        let secret = required(PUSHER_SECRET)?;
        let cluster = required(PUSHER_CLUSTER)?;

        Self::new(&app_id, &key, &secret, &cluster)
    }

    /// Point the client at a different API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn events_path(&self) -> String {
        format!("/apps/{}/events", self.app_id)
    }

    /// Signed query string for a POST of `body` to `path` at `timestamp`
    fn signed_query(&self, path: &str, body: &str, timestamp: u64) -> String {
        let query = format!(
            "auth_key={}&auth_timestamp={}&auth_version={}&body_md5={}",
            self.key,
            timestamp,
            AUTH_VERSION,
            body_md5(body)
        );
        let signature = sign(
            self.secret.expose_secret(),
            &format!("POST\n{path}\n{query}"),
        );
        format!("{query}&auth_signature={signature}")
    }
}

#[async_trait]
impl PushPublisher for PusherClient {
    #[instrument(skip(self, data), fields(provider = "pusher"))]
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        data: &serde_json::Map<String, serde_json::Value>,
    ) -> ProviderResult<()> {
        validate_channel(channel)?;
        if event.chars().count() > MAX_NAME_LEN {
            return Err(ProviderError::InvalidEvent(event.to_string()));
        }

        // Pusher's limit counts characters, not UTF-8 bytes
        let data = serde_json::to_string(data)?;
        let size = data.chars().count();
        if size > MAX_DATA_LEN {
            return Err(ProviderError::PayloadTooLarge {
                size,
                limit: MAX_DATA_LEN,
            });
        }

        let body = serde_json::to_string(&TriggerBody {
            name: event,
            channels: [channel],
            data,
        })?;

        let path = self.events_path();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let url = format!(
            "{}{}?{}",
            self.base_url,
            path,
            self.signed_query(&path, &body, timestamp)
        );

        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: Provider::Pusher,
                source: source.without_url(),
            })?;

        if !response.status().is_success() {
            return Err(rejection(Provider::Pusher, response).await);
        }

        debug!(status = response.status().as_u16(), "Pusher accepted event");
        Ok(())
    }
}

fn validate_channel(channel: &str) -> ProviderResult<()> {
    let valid_chars = channel
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_-=@,.;".contains(c));

    if channel.is_empty() || channel.len() > MAX_NAME_LEN || !valid_chars {
        return Err(ProviderError::InvalidChannel(channel.to_string()));
    }
    Ok(())
}

fn body_md5(body: &str) -> String {
    format!("{:x}", Md5::digest(body.as_bytes()))
}

fn sign(secret: &str, message: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::sign(&key, message.as_bytes())
        .as_ref()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
