use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// -- Channels --

/// The two notification streams the backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Broadcast to every user.
    Global,
    /// Scoped to an event the user registered for, or to the user directly.
    Event,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Global, Channel::Event];

    /// Path segment under `/api/v1/notification/`.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Event => "event",
        }
    }

    pub fn other(self) -> Channel {
        match self {
            Self::Global => Self::Event,
            Self::Event => Self::Global,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.path_segment())
    }
}

/// Value of the record-level `type` discriminator, also sent as the `type`
/// query parameter when marking a single notification read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    #[default]
    Global,
    #[serde(alias = "EVENT")]
    Personal,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "GLOBAL",
            Self::Personal => "PERSONAL",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// -- Records --

/// A notification exactly as the backend sends it.
///
/// Older endpoints report read state as `read`, newer ones as `isRead`, and
/// some responses carry both or neither. Consumers should not look at either
/// flag directly; the client converts records into [`Notification`] on
/// ingestion.
///
/// The read flags are tri-state: `None` when the field is absent,
/// `Some(None)` when it is sent as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub read: Option<Option<bool>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub is_read: Option<Option<bool>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NotificationKind>,
    #[serde(
        default,
        deserialize_with = "opaque_id_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_id: Option<String>,
}

/// Canonical notification with a single read flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub created_at: String,
    /// Delivery time, or `created_at` when the backend did not report one.
    pub sent_at: String,
    pub unread: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<NotificationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl Notification {
    /// Parsed delivery timestamp, if the backend sent something parseable.
    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.sent_at)
    }
}

/// Parse an ISO-8601 timestamp. The backend serialises some timestamps without
/// an offset (`2024-05-01T09:30:00`); those are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|ndt| ndt.and_utc()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .ok()
}

// Identifiers arrive as strings from some endpoints and as numbers from others.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

// Only called when the field is in the payload, so an explicit null becomes
// `Some(None)` while `default` covers the absent case.
fn present<'de, D: Deserializer<'de>, T: Deserialize<'de>>(deserializer: D) -> Result<Option<Option<T>>, D::Error> {
    Option::<T>::deserialize(deserializer).map(Some)
}

fn opaque_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn opaque_id_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}
