//! Status check records
//!
//! A status check is a heartbeat/audit record: a client name and the moment
//! the server received it. Records are immutable once created.
//!
//! Timestamps are persisted as ISO-8601 text with an explicit `+00:00`
//! offset and microsecond precision, and parsed back into [`DateTime<Utc>`]
//! on read.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A recorded status check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCheck {
    /// Server-generated unique identifier
    pub id: String,

    /// Caller-supplied client name
    pub client_name: String,

    /// Server-generated creation time (UTC)
    pub timestamp: DateTime<Utc>,
}

impl StatusCheck {
    /// Create a new record for `client_name`, stamped with a fresh id and the current time.
    ///
    /// The time is truncated to the stored microsecond precision so the
    /// returned record equals what a later read yields.
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            client_name: client_name.into(),
            timestamp: Utc::now().trunc_subsecs(6),
        }
    }

    /// Rebuild a record from its stored columns
    pub fn from_stored(
        id: String,
        client_name: String,
        timestamp: &str,
    ) -> Result<Self, TimestampError> {
        Ok(Self {
            id,
            client_name,
            timestamp: parse_timestamp(timestamp)?,
        })
    }

    /// The timestamp in its stored text form
    pub fn timestamp_iso(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

/// Request body for creating a status check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

/// Errors decoding a stored timestamp
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("Invalid ISO-8601 timestamp '{value}': {reason}")]
    Invalid { value: String, reason: String },
}

/// Format a timestamp as ISO-8601 text, e.g. `2024-05-01T09:30:00.123456+00:00`
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse stored ISO-8601 text back into a UTC timestamp.
///
/// Values carrying an offset are converted to UTC. Values without one are
/// taken to already be UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    value
        .parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|e| TimestampError::Invalid {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
