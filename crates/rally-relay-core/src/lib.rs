//! Rally Relay core types
//!
//! Shared domain types for the status registry and the pub/sub relay. This
//! crate carries no I/O; the db, service and api crates build on it.

pub mod relay;
pub mod status;

pub use relay::{
    channel_name, Provider, ProviderState, ProviderStatusReport, PublishOutcome, PublishRequest,
    PublishResponse, CHANNEL_PREFIX, UPDATE_EVENT,
};
pub use status::{StatusCheck, StatusCheckCreate, TimestampError};
