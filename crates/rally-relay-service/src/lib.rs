//! Rally Relay service layer
//!
//! Business logic behind the HTTP API:
//! - [`StatusService`]: create and list status checks
//! - [`RelayService`]: publish payloads to Ably or Pusher and report provider state
//!
//! [`ServiceRegistry`] bundles both for the API layer.

pub mod adapters;
pub mod credentials;
pub mod error;
pub mod relay;
pub mod status;

use std::sync::Arc;

use rally_relay_db::StatusStore;

pub use adapters::{AblyClient, ProviderError, PusherClient, PushPublisher};
pub use credentials::{CredentialSource, EnvCredentials, StaticCredentials};
pub use error::{ServiceError, ServiceResult};
pub use relay::{ProviderEndpoints, RelayService};
pub use status::StatusService;

/// All services used by the API layer
pub struct ServiceRegistry {
    status: StatusService,
    relay: RelayService,
}

impl ServiceRegistry {
    /// Wire services over a store and a credential source
    pub fn new(store: Arc<dyn StatusStore>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            status: StatusService::new(store),
            relay: RelayService::new(credentials),
        }
    }

    /// Replace the relay service, e.g. to point providers at test endpoints
    pub fn with_relay(mut self, relay: RelayService) -> Self {
        self.relay = relay;
        self
    }

    pub fn status(&self) -> &StatusService {
        &self.status
    }

    pub fn relay(&self) -> &RelayService {
        &self.relay
    }
}
