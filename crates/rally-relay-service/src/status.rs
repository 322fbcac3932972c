//! Status registry service

use std::sync::Arc;

use rally_relay_core::StatusCheck;
use rally_relay_db::{StatusStore, MAX_LIST_LIMIT};
use tracing::{debug, info, instrument};

use crate::error::ServiceResult;

/// Appends and lists status checks
pub struct StatusService {
    store: Arc<dyn StatusStore>,
}

impl StatusService {
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    /// Record a status check for `client_name`
    #[instrument(skip(self))]
    pub async fn create(&self, client_name: String) -> ServiceResult<StatusCheck> {
        let check = StatusCheck::new(client_name);
        self.store.insert(&check).await?;

        info!(id = %check.id, "Status check recorded");
        Ok(check)
    }

    /// List status checks in insertion order, at most 1000
    #[instrument(skip(self))]
    pub async fn list(&self) -> ServiceResult<Vec<StatusCheck>> {
        let checks = self.store.list(MAX_LIST_LIMIT).await?;
        debug!(count = checks.len(), "Status checks listed");
        Ok(checks)
    }

    /// Probe the backing store
    pub async fn check_store(&self) -> ServiceResult<()> {
        self.store.ping().await?;
        Ok(())
    }
}
