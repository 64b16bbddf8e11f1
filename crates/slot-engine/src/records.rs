//! Upstream record types, one per Calendly endpoint.
//!
//! Collections are decoded record by record: a record that does not match
//! its schema is skipped and logged, and the rest of the page survives.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Render an instant in the upstream wire format,
/// e.g. `2026-03-16T09:00:00.000Z`.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One start-time option from `event_type_available_times`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableTime {
    pub status: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub invitees_remaining: Option<u32>,
    #[serde(default)]
    pub scheduling_url: Option<String>,
}

impl AvailableTime {
    pub fn is_available(&self) -> bool {
        self.status == "available"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMembership {
    pub user: String,
}

/// One booked meeting from `scheduled_events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub uri: String,
    #[serde(default)]
    pub name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub event_memberships: Vec<EventMembership>,
}

impl ScheduledEvent {
    pub fn is_hosted_by(&self, user_uri: &str) -> bool {
        self.event_memberships.iter().any(|m| m.user == user_uri)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub current_organization: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventType {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    /// Minutes.
    #[serde(default)]
    pub duration: Option<u32>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberUser {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMembership {
    #[serde(default)]
    pub role: Option<String>,
    pub user: MemberUser,
}

/// `{ "resource": { ... } }`
#[derive(Debug, Deserialize)]
pub(crate) struct ResourceEnvelope<T> {
    pub resource: T,
}

/// `{ "collection": [...], "pagination": { "next_page_token": ... } }`
#[derive(Debug, Deserialize)]
pub(crate) struct CollectionEnvelope {
    #[serde(default)]
    pub collection: Vec<Value>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Pagination {
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// One decoded page of a collection endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Records dropped because they did not match the schema.
    pub skipped: usize,
    pub next_page_token: Option<String>,
}

impl CollectionEnvelope {
    pub(crate) fn into_page<T: DeserializeOwned>(self, endpoint: &str) -> Page<T> {
        let mut items = Vec::with_capacity(self.collection.len());
        let mut skipped = 0;

        for (index, raw) in self.collection.into_iter().enumerate() {
            match serde_json::from_value::<T>(raw) {
                Ok(item) => items.push(item),
                Err(e) => {
                    skipped += 1;
                    tracing::debug!(endpoint, index, error = %e, "skipping malformed record");
                }
            }
        }

        Page {
            items,
            skipped,
            next_page_token: self
                .pagination
                .and_then(|p| p.next_page_token)
                .filter(|t| !t.is_empty()),
        }
    }
}
