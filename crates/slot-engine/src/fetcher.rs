//! Fetch raw availability for one event type over an arbitrary span.
//!
//! The span is cut into pieces the upstream accepts and requested piece by
//! piece. A failing piece contributes nothing and is counted in the outcome;
//! only a configuration error aborts the fetch. Complete outcomes are
//! memoized for the configured TTL.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use moka::future::Cache;
use serde::Serialize;

use crate::client::AvailabilitySource;
use crate::error::Result;
use crate::notice::FetchWindow;

const CACHE_CAPACITY: u64 = 1_024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FetchKey {
    event_type: String,
    window: FetchWindow,
    credential: u64,
}

/// Available start times for one event type, in upstream order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchOutcome {
    pub starts: Vec<DateTime<Utc>>,
    pub requested_windows: usize,
    pub failed_windows: usize,
}

impl FetchOutcome {
    /// Some piece failed, so `starts` may under-report availability.
    pub fn is_degraded(&self) -> bool {
        self.failed_windows > 0
    }
}

pub struct AvailabilityFetcher {
    source: Arc<dyn AvailabilitySource>,
    max_span: Duration,
    /// `None` when the TTL is zero.
    cache: Option<Cache<FetchKey, FetchOutcome>>,
}

impl AvailabilityFetcher {
    pub fn new(source: Arc<dyn AvailabilitySource>, max_span: Duration, ttl: StdDuration) -> Self {
        let cache = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(ttl)
                .build()
        });
        Self {
            source,
            max_span,
            cache,
        }
    }

    pub async fn fetch(&self, event_type: &str, window: FetchWindow) -> Result<FetchOutcome> {
        let key = FetchKey {
            event_type: event_type.to_string(),
            window,
            credential: self.source.credential_fingerprint(),
        };

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key).await {
                tracing::debug!(event_type, "availability cache hit");
                return Ok(hit);
            }
        }

        let mut outcome = FetchOutcome::default();
        for piece in window.split(self.max_span) {
            outcome.requested_windows += 1;
            match self.source.available_times(event_type, piece).await {
                Ok(records) => outcome.starts.extend(
                    records
                        .into_iter()
                        .filter(|r| r.is_available())
                        .map(|r| r.start_time),
                ),
                Err(e) if e.is_configuration() => return Err(e),
                Err(e) => {
                    outcome.failed_windows += 1;
                    tracing::warn!(
                        event_type,
                        start = %piece.start,
                        end = %piece.end,
                        error = %e,
                        "availability window failed, treating as empty"
                    );
                }
            }
        }

        if let Some(cache) = &self.cache {
            if !outcome.is_degraded() {
                cache.insert(key, outcome.clone()).await;
            }
        }
        Ok(outcome)
    }
}
