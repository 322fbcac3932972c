//! Storage seam for status checks

use async_trait::async_trait;
use rally_relay_core::StatusCheck;

use crate::error::DbResult;

/// Upper bound on records returned by a single listing
pub const MAX_LIST_LIMIT: i64 = 1000;

/// Append-only storage for status checks
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Persist a new record
    async fn insert(&self, check: &StatusCheck) -> DbResult<()>;

    /// Read up to `limit` records in insertion order
    async fn list(&self, limit: i64) -> DbResult<Vec<StatusCheck>>;

    /// Round-trip to the backing store
    async fn ping(&self) -> DbResult<()>;
}
