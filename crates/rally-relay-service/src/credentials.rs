//! Provider credential lookup
//!
//! Provider clients are built lazily, so their credentials are looked up on
//! demand rather than captured at startup. Empty values count as missing.

use std::collections::HashMap;

/// Ably API key (`<app>.<key id>:<secret>`)
pub const ABLY_KEY: &str = "ABLY_KEY";
/// Pusher application id
pub const PUSHER_APP_ID: &str = "PUSHER_APP_ID";
/// Pusher application key
pub const PUSHER_KEY: &str = "PUSHER_KEY";
/// Pusher application secret
pub const PUSHER_SECRET: &str = "PUSHER_SECRET";
/// Pusher cluster, e.g. `eu`
pub const PUSHER_CLUSTER: &str = "PUSHER_CLUSTER";

/// Source of provider credentials
pub trait CredentialSource: Send + Sync {
    /// Raw lookup; may return empty strings
    fn lookup(&self, name: &str) -> Option<String>;

    /// Lookup that treats empty values as absent
    fn get(&self, name: &str) -> Option<String> {
        self.lookup(name).filter(|value| !value.is_empty())
    }

    fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Credentials read from the process environment at lookup time
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed credential set
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn lookup(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}
