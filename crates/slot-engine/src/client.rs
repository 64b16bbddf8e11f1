//! Calendly HTTP client and the availability seam the fetcher depends on.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::{Result, SlotError};
use crate::notice::FetchWindow;
use crate::records::{
    format_instant, AvailableTime, CollectionEnvelope, CurrentUser, EventType,
    OrganizationMembership, Page, ResourceEnvelope, ScheduledEvent,
};

pub const DEFAULT_BASE_URL: &str = "https://api.calendly.com";

/// Page size requested from collection endpoints.
const PAGE_SIZE: &str = "100";

/// Source of raw start-time options for one event type over one window.
///
/// The window passed in never exceeds the upstream span limit; splitting is
/// the caller's job.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn available_times(
        &self,
        event_type: &str,
        window: FetchWindow,
    ) -> Result<Vec<AvailableTime>>;

    /// Identifies the credential requests are made with, for cache keys.
    fn credential_fingerprint(&self) -> u64;
}

/// A Calendly personal access token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Rejects an absent or blank key up front so it is reported as a
    /// configuration problem rather than as missing availability.
    pub fn new(key: Option<String>) -> Result<Self> {
        match key.map(|k| k.trim().to_string()) {
            Some(k) if !k.is_empty() => Ok(Self(k)),
            _ => Err(SlotError::MissingCredential),
        }
    }

    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        hasher.finish()
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Whose scheduled events to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOwner {
    User(String),
    Organization(String),
}

impl EventOwner {
    fn query_pair(&self) -> (&'static str, String) {
        match self {
            EventOwner::User(uri) => ("user", uri.clone()),
            EventOwner::Organization(uri) => ("organization", uri.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalendlyClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl CalendlyClient {
    pub fn new(base_url: &str, credential: Credential) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, ?query, "GET");

        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.credential.bearer())
            .header("Content-Type", "application/json")
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        resp.json::<T>()
            .await
            .map_err(|e| SlotError::MalformedRecord(format!("{}: {}", path, e)))
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        mut query: Vec<(&str, String)>,
        page_token: Option<&str>,
    ) -> Result<Page<T>> {
        if let Some(token) = page_token {
            query.push(("page_token", token.to_string()));
        }
        let envelope: CollectionEnvelope = self.get(path, &query).await?;
        Ok(envelope.into_page(path))
    }

    /// Follow `next_page_token` until the collection is exhausted.
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(&str, String)>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page: Page<T> = self.get_page(path, query.clone(), token.as_deref()).await?;
            items.extend(page.items);
            match page.next_page_token {
                Some(next) if token.as_deref() != Some(next.as_str()) => token = Some(next),
                _ => break,
            }
        }

        Ok(items)
    }

    /// One page of active scheduled events starting inside `window`.
    pub async fn scheduled_events(
        &self,
        owner: &EventOwner,
        window: FetchWindow,
        page_token: Option<&str>,
    ) -> Result<Page<ScheduledEvent>> {
        let query = vec![
            owner.query_pair(),
            ("min_start_time", format_instant(window.start)),
            ("max_start_time", format_instant(window.end)),
            ("count", PAGE_SIZE.to_string()),
            ("status", "active".to_string()),
        ];
        self.get_page("/scheduled_events", query, page_token).await
    }

    /// The user and organization the credential belongs to.
    pub async fn current_user(&self) -> Result<CurrentUser> {
        let envelope: ResourceEnvelope<CurrentUser> = self.get("/users/me", &[]).await?;
        Ok(envelope.resource)
    }

    pub async fn event_types(&self, user_uri: &str) -> Result<Vec<EventType>> {
        let query = vec![
            ("user", user_uri.to_string()),
            ("count", PAGE_SIZE.to_string()),
        ];
        self.get_all("/event_types", query).await
    }

    pub async fn organization_members(
        &self,
        organization_uri: &str,
    ) -> Result<Vec<OrganizationMembership>> {
        let query = vec![
            ("organization", organization_uri.to_string()),
            ("count", PAGE_SIZE.to_string()),
        ];
        self.get_all("/organization_memberships", query).await
    }
}

#[async_trait]
impl AvailabilitySource for CalendlyClient {
    async fn available_times(
        &self,
        event_type: &str,
        window: FetchWindow,
    ) -> Result<Vec<AvailableTime>> {
        let query = vec![
            ("event_type", event_type.to_string()),
            ("start_time", format_instant(window.start)),
            ("end_time", format_instant(window.end)),
        ];
        self.get_all("/event_type_available_times", query).await
    }

    fn credential_fingerprint(&self) -> u64 {
        self.credential.fingerprint()
    }
}

fn status_error(status: StatusCode, body: &str) -> SlotError {
    let message = upstream_message(body);
    match status {
        StatusCode::UNAUTHORIZED => SlotError::InvalidCredential,
        StatusCode::FORBIDDEN => SlotError::PermissionDenied(message),
        _ => SlotError::Upstream {
            status: status.as_u16(),
            message,
        },
    }
}

/// Calendly error bodies look like `{"title": ..., "message": ...}`.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
