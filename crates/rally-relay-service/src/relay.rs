//! Pub/sub relay service
//!
//! Forwards a caller payload to Ably or Pusher. Each provider client is
//! built on first use from the credential source and then kept for the life
//! of the service. Construction happens at most once per provider; an
//! attempt that finds credentials missing leaves the slot empty so a later
//! call can try again.
//!
//! Relay failures never escape as errors: every path ends in a
//! [`PublishOutcome`].

use std::sync::Arc;

use rally_relay_core::{
    channel_name, Provider, ProviderState, ProviderStatusReport, PublishOutcome, PublishRequest,
    UPDATE_EVENT,
};
use tokio::sync::OnceCell;
use tracing::{error, info, instrument, warn};

use crate::adapters::{AblyClient, ProviderError, ProviderResult, PushPublisher, PusherClient};
use crate::credentials::{CredentialSource, ABLY_KEY, PUSHER_KEY};

/// Base URL overrides for provider clients
#[derive(Debug, Clone, Default)]
pub struct ProviderEndpoints {
    pub ably: Option<String>,
    pub pusher: Option<String>,
}

/// Relays payloads to push-messaging providers
pub struct RelayService {
    credentials: Arc<dyn CredentialSource>,
    endpoints: ProviderEndpoints,
    ably: OnceCell<AblyClient>,
    pusher: OnceCell<PusherClient>,
}

impl RelayService {
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            credentials,
            endpoints: ProviderEndpoints::default(),
            ably: OnceCell::new(),
            pusher: OnceCell::new(),
        }
    }

    /// Override provider base URLs for clients built from now on
    pub fn with_endpoints(mut self, endpoints: ProviderEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    async fn ably_client(&self) -> ProviderResult<&AblyClient> {
        self.ably
            .get_or_try_init(|| async {
                let mut client = AblyClient::from_credentials(self.credentials.as_ref())?;
                if let Some(url) = &self.endpoints.ably {
                    client = client.with_base_url(url.clone());
                }
                info!(key_name = client.key_name(), "Ably client initialized");
                Ok::<_, ProviderError>(client)
            })
            .await
    }

    async fn pusher_client(&self) -> ProviderResult<&PusherClient> {
        self.pusher
            .get_or_try_init(|| async {
                let mut client = PusherClient::from_credentials(self.credentials.as_ref())?;
                if let Some(url) = &self.endpoints.pusher {
                    client = client.with_base_url(url.clone());
                }
                info!(base_url = client.base_url(), "Pusher client initialized");
                Ok::<_, ProviderError>(client)
            })
            .await
    }

    async fn publisher(&self, provider: Provider) -> ProviderResult<&dyn PushPublisher> {
        match provider {
            Provider::Ably => Ok(self.ably_client().await? as &dyn PushPublisher),
            Provider::Pusher => Ok(self.pusher_client().await? as &dyn PushPublisher),
        }
    }

    /// Publish `request.data` as an `update` event on `rally-{channel_id}`
    #[instrument(skip(self, request), fields(provider = %request.provider, channel_id = %request.channel_id))]
    pub async fn publish(&self, request: PublishRequest) -> PublishOutcome {
        let Some(provider) = Provider::from_selector(&request.provider) else {
            warn!("Unknown provider selector");
            return PublishOutcome::UnknownProvider(request.provider);
        };

        let channel = channel_name(&request.channel_id);
        let result = match self.publisher(provider).await {
            Ok(publisher) => publisher.publish(&channel, UPDATE_EVENT, &request.data).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!(%channel, "Published update to {}", provider);
                PublishOutcome::Published(provider)
            }
            Err(ProviderError::NotConfigured(provider)) => {
                warn!("{} credentials missing, nothing published", provider);
                PublishOutcome::NotConfigured(provider)
            }
            Err(e) => {
                error!(%channel, error = %e, "Publish failed");
                PublishOutcome::DownstreamFailure {
                    selector: request.provider,
                    message: e.to_string(),
                }
            }
        }
    }

    /// Report per-provider client and key state.
    ///
    /// `configured` attempts client construction; `key_present` only looks
    /// at the primary credential, so the two can disagree.
    #[instrument(skip(self))]
    pub async fn status(&self) -> ProviderStatusReport {
        ProviderStatusReport {
            ably: ProviderState {
                configured: self.ably_client().await.is_ok(),
                key_present: self.credentials.is_present(ABLY_KEY),
            },
            pusher: ProviderState {
                configured: self.pusher_client().await.is_ok(),
                key_present: self.credentials.is_present(PUSHER_KEY),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{
        StaticCredentials, PUSHER_APP_ID, PUSHER_CLUSTER, PUSHER_SECRET,
    };
    use rally_relay_core::PublishResponse;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(provider: &str, channel_id: &str) -> PublishRequest {
        PublishRequest {
            provider: provider.to_string(),
            channel_id: channel_id.to_string(),
            data: json!({"x": 1}).as_object().cloned().unwrap(),
        }
    }

    fn pusher_credentials() -> StaticCredentials {
        StaticCredentials::new()
            .with(PUSHER_APP_ID, "42")
            .with(PUSHER_KEY, "app-key")
            .with(PUSHER_SECRET, "app-secret")
            .with(PUSHER_CLUSTER, "eu")
    }

    fn relay(credentials: StaticCredentials, server: &MockServer) -> RelayService {
        RelayService::new(Arc::new(credentials)).with_endpoints(ProviderEndpoints {
            ably: Some(server.uri()),
            pusher: Some(server.uri()),
        })
    }

    /// Counts lookups of one credential name
    struct CountingCredentials {
        inner: StaticCredentials,
        watched: &'static str,
        hits: AtomicUsize,
    }

    impl CredentialSource for CountingCredentials {
        fn lookup(&self, name: &str) -> Option<String> {
            if name == self.watched {
                self.hits.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.lookup(name)
        }
    }

    #[tokio::test]
    async fn test_ably_not_configured_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = relay(StaticCredentials::new(), &server)
            .publish(request("1", "abc"))
            .await;

        assert_eq!(outcome, PublishOutcome::NotConfigured(Provider::Ably));
        assert_eq!(
            PublishResponse::from(outcome),
            PublishResponse {
                success: false,
                message: "Ably not configured".to_string(),
                provider: "Ably".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_pusher_needs_all_four_credentials() {
        let server = MockServer::start().await;
        let credentials = StaticCredentials::new()
            .with(PUSHER_APP_ID, "42")
            .with(PUSHER_KEY, "app-key")
            .with(PUSHER_SECRET, "app-secret");

        let outcome = relay(credentials, &server).publish(request("2", "abc")).await;
        assert_eq!(outcome, PublishOutcome::NotConfigured(Provider::Pusher));
    }

    #[tokio::test]
    async fn test_pusher_publish_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apps/42/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = relay(pusher_credentials(), &server)
            .publish(request("2", "abc"))
            .await;
        assert_eq!(outcome, PublishOutcome::Published(Provider::Pusher));

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["channels"], json!(["rally-abc"]));
        assert_eq!(body["name"], "update");
    }

    #[tokio::test]
    async fn test_ably_publish_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels/rally-stage-7/messages"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let credentials = StaticCredentials::new().with(ABLY_KEY, "app.key:secret");
        let outcome = relay(credentials, &server)
            .publish(request("1", "stage-7"))
            .await;
        assert_eq!(outcome, PublishOutcome::Published(Provider::Ably));
        assert_eq!(PublishResponse::from(outcome).message, "Published to Ably");
    }

    #[tokio::test]
    async fn test_unknown_provider_ignores_configuration() {
        let server = MockServer::start().await;
        let credentials = pusher_credentials().with(ABLY_KEY, "app.key:secret");

        let outcome = relay(credentials, &server).publish(request("9", "abc")).await;
        assert_eq!(outcome, PublishOutcome::UnknownProvider("9".to_string()));
    }

    #[tokio::test]
    async fn test_downstream_failure_reports_raw_selector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let outcome = relay(pusher_credentials(), &server)
            .publish(request("2", "abc"))
            .await;

        let response = PublishResponse::from(outcome);
        assert!(!response.success);
        assert_eq!(response.provider, "2");
        assert!(response.message.contains("boom"));
    }

    #[tokio::test]
    async fn test_malformed_ably_key_is_a_downstream_failure() {
        let server = MockServer::start().await;
        let credentials = StaticCredentials::new().with(ABLY_KEY, "no-secret-here");

        let outcome = relay(credentials, &server).publish(request("1", "abc")).await;
        assert!(matches!(
            outcome,
            PublishOutcome::DownstreamFailure { ref selector, .. } if selector == "1"
        ));
    }

    #[tokio::test]
    async fn test_status_key_present_independent_of_configured() {
        let server = MockServer::start().await;
        let credentials = StaticCredentials::new()
            .with(ABLY_KEY, "app.key:secret")
            .with(PUSHER_KEY, "app-key");

        let report = relay(credentials, &server).status().await;

        assert!(report.ably.configured);
        assert!(report.ably.key_present);
        assert!(!report.pusher.configured);
        assert!(report.pusher.key_present);
    }

    #[tokio::test]
    async fn test_status_with_nothing_configured() {
        let server = MockServer::start().await;
        let report = relay(StaticCredentials::new().with(ABLY_KEY, ""), &server)
            .status()
            .await;
        assert_eq!(report, ProviderStatusReport::default());
    }

    #[tokio::test]
    async fn test_client_is_built_once_under_concurrency() {
        let credentials = Arc::new(CountingCredentials {
            inner: pusher_credentials(),
            watched: PUSHER_APP_ID,
            hits: AtomicUsize::new(0),
        });
        let service = Arc::new(RelayService::new(credentials.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.status().await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().pusher.configured);
        }

        assert_eq!(credentials.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_credentials_are_retried_later() {
        let credentials = Arc::new(CountingCredentials {
            inner: StaticCredentials::new(),
            watched: ABLY_KEY,
            hits: AtomicUsize::new(0),
        });
        let service = RelayService::new(credentials.clone());

        service.publish(request("1", "abc")).await;
        service.publish(request("1", "abc")).await;

        assert_eq!(credentials.hits.load(Ordering::SeqCst), 2);
    }
}
