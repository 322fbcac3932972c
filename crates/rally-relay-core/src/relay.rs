//! Pub/sub relay contracts
//!
//! Request and response shapes for relaying a payload to a push-messaging
//! provider, plus the internal [`PublishOutcome`] the relay service produces
//! before it is mapped onto the wire response.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace prepended to every caller-supplied channel id
pub const CHANNEL_PREFIX: &str = "rally-";

/// Event name used for every relayed message
pub const UPDATE_EVENT: &str = "update";

/// Derive the provider-side channel name for a caller channel id
pub fn channel_name(channel_id: &str) -> String {
    format!("{CHANNEL_PREFIX}{channel_id}")
}

/// Supported push-messaging providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// Selector `"1"`
    Ably,
    /// Selector `"2"`
    Pusher,
}

impl Provider {
    /// Resolve a request selector; anything but `"1"`/`"2"` is unknown
    pub fn from_selector(selector: &str) -> Option<Self> {
        match selector {
            "1" => Some(Self::Ably),
            "2" => Some(Self::Pusher),
            _ => None,
        }
    }

    /// Human-readable provider label
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ably => "Ably",
            Self::Pusher => "Pusher",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Request body for `POST /api/ws/publish`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    /// Provider selector, `"1"` (Ably) or `"2"` (Pusher)
    pub provider: String,

    /// Caller channel id; the provider channel is `rally-{channel_id}`
    pub channel_id: String,

    /// Opaque payload, relayed unmodified
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Response body for `POST /api/ws/publish`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResponse {
    pub success: bool,
    pub message: String,
    pub provider: String,
}

/// Result of a single relay attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The provider accepted the message
    Published(Provider),

    /// Credentials for the provider are missing
    NotConfigured(Provider),

    /// The selector matched no provider
    UnknownProvider(String),

    /// The provider client failed; `selector` is the raw request token
    DownstreamFailure { selector: String, message: String },
}

impl From<PublishOutcome> for PublishResponse {
    fn from(outcome: PublishOutcome) -> Self {
        match outcome {
            PublishOutcome::Published(provider) => Self {
                success: true,
                message: format!("Published to {provider}"),
                provider: provider.display_name().to_string(),
            },
            PublishOutcome::NotConfigured(provider) => Self {
                success: false,
                message: format!("{provider} not configured"),
                provider: provider.display_name().to_string(),
            },
            PublishOutcome::UnknownProvider(selector) => Self {
                success: false,
                message: format!("Unknown provider: {selector}"),
                provider: "Unknown".to_string(),
            },
            // The failure path echoes the raw selector, not the display name
            PublishOutcome::DownstreamFailure { selector, message } => Self {
                success: false,
                message,
                provider: selector,
            },
        }
    }
}

/// Configuration state of one provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderState {
    /// A client has been constructed
    pub configured: bool,

    /// The primary credential is set and non-empty
    pub key_present: bool,
}

/// Response body for `GET /api/ws/status`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatusReport {
    pub ably: ProviderState,
    pub pusher: ProviderState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name_is_prefixed() {
        assert_eq!(channel_name("abc"), "rally-abc");
        assert_eq!(channel_name(""), "rally-");
    }

    #[test]
    fn test_selector_resolution() {
        assert_eq!(Provider::from_selector("1"), Some(Provider::Ably));
        assert_eq!(Provider::from_selector("2"), Some(Provider::Pusher));
        assert_eq!(Provider::from_selector("9"), None);
        assert_eq!(Provider::from_selector(" 1"), None);
    }

    #[test]
    fn test_published_maps_to_display_name() {
        let response = PublishResponse::from(PublishOutcome::Published(Provider::Pusher));
        assert!(response.success);
        assert_eq!(response.message, "Published to Pusher");
        assert_eq!(response.provider, "Pusher");
    }

    #[test]
    fn test_not_configured_message() {
        let response = PublishResponse::from(PublishOutcome::NotConfigured(Provider::Ably));
        assert!(!response.success);
        assert_eq!(response.message, "Ably not configured");
        assert_eq!(response.provider, "Ably");
    }

    #[test]
    fn test_unknown_provider_message() {
        let response = PublishResponse::from(PublishOutcome::UnknownProvider("9".to_string()));
        assert!(!response.success);
        assert_eq!(response.message, "Unknown provider: 9");
        assert_eq!(response.provider, "Unknown");
    }

    #[test]
    fn test_failure_echoes_raw_selector() {
        let response = PublishResponse::from(PublishOutcome::DownstreamFailure {
            selector: "2".to_string(),
            message: "connection refused".to_string(),
        });
        assert!(!response.success);
        assert_eq!(response.message, "connection refused");
        assert_eq!(response.provider, "2");
    }

    #[test]
    fn test_publish_request_requires_object_data() {
        let ok: Result<PublishRequest, _> = serde_json::from_value(serde_json::json!({
            "provider": "1",
            "channel_id": "abc",
            "data": {"x": 1},
            "extra": true
        }));
        assert!(ok.is_ok());

        let not_object: Result<PublishRequest, _> = serde_json::from_value(serde_json::json!({
            "provider": "1",
            "channel_id": "abc",
            "data": [1, 2]
        }));
        assert!(not_object.is_err());
    }

    #[test]
    fn test_status_report_shape() {
        let report = ProviderStatusReport {
            ably: ProviderState { configured: false, key_present: true },
            pusher: ProviderState::default(),
        };
        let value = serde_json::to_value(report).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "ably": {"configured": false, "key_present": true},
                "pusher": {"configured": false, "key_present": false}
            })
        );
    }
}
