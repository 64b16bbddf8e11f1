//! Shared helpers: a scripted in-memory upstream and roster builders.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slot_engine::error::{Result, SlotError};
use slot_engine::records::AvailableTime;
use slot_engine::{AvailabilitySource, FetchWindow, Specialist};

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    rfc3339.parse().unwrap()
}

pub fn specialist(name: &str, languages: &[&str]) -> Specialist {
    Specialist {
        name: name.to_string(),
        user_uri: format!("https://api.calendly.com/users/{}", name.to_lowercase()),
        event_type_uri: format!("https://api.calendly.com/event_types/{}", name.to_lowercase()),
        languages: languages.iter().map(|l| l.to_string()).collect(),
        team: "EMEA".to_string(),
        active: true,
    }
}

/// Serves a fixed set of start times per event type, filtered to each
/// requested window, and records every request it receives.
#[derive(Default)]
pub struct StubSource {
    offers: HashMap<String, Vec<AvailableTime>>,
    failing: HashSet<String>,
    fail_from: Option<DateTime<Utc>>,
    reject_credential: bool,
    fingerprint: AtomicU64,
    delay: Option<StdDuration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    windows: Mutex<Vec<(String, FetchWindow)>>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer `starts` as available for `specialist`'s event type.
    pub fn offer(mut self, specialist: &Specialist, starts: &[&str]) -> Self {
        let entry = self
            .offers
            .entry(specialist.event_type_uri.clone())
            .or_default();
        entry.extend(starts.iter().map(|s| AvailableTime {
            status: "available".to_string(),
            start_time: at(s),
            invitees_remaining: Some(1),
            scheduling_url: None,
        }));
        self
    }

    /// Offer a start time with a non-available status.
    pub fn offer_status(mut self, specialist: &Specialist, start: &str, status: &str) -> Self {
        self.offers
            .entry(specialist.event_type_uri.clone())
            .or_default()
            .push(AvailableTime {
                status: status.to_string(),
                start_time: at(start),
                invitees_remaining: None,
                scheduling_url: None,
            });
        self
    }

    /// Every request for `specialist` fails with HTTP 500.
    pub fn failing(mut self, specialist: &Specialist) -> Self {
        self.failing.insert(specialist.event_type_uri.clone());
        self
    }

    /// Requests for windows starting at or after `from` fail with HTTP 502.
    pub fn failing_from(mut self, from: &str) -> Self {
        self.fail_from = Some(at(from));
        self
    }

    /// Every request fails with HTTP 401.
    pub fn rejecting_credential(mut self) -> Self {
        self.reject_credential = true;
        self
    }

    pub fn with_fingerprint(self, fingerprint: u64) -> Self {
        self.rotate_credential(fingerprint);
        self
    }

    /// Switch to a different credential between fetches.
    pub fn rotate_credential(&self, fingerprint: u64) {
        self.fingerprint.store(fingerprint, Ordering::SeqCst);
    }

    /// Every request takes `delay` before answering.
    pub fn with_delay(mut self, delay: StdDuration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Most requests that were ever in progress at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn windows(&self) -> Vec<(String, FetchWindow)> {
        self.windows.lock().unwrap().clone()
    }
}

#[async_trait]
impl AvailabilitySource for StubSource {
    async fn available_times(
        &self,
        event_type: &str,
        window: FetchWindow,
    ) -> Result<Vec<AvailableTime>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.windows
            .lock()
            .unwrap()
            .push((event_type.to_string(), window));

        if self.reject_credential {
            return Err(SlotError::InvalidCredential);
        }
        if self.failing.contains(event_type) {
            return Err(SlotError::Upstream {
                status: 500,
                message: "boom".to_string(),
            });
        }
        if self.fail_from.is_some_and(|from| window.start >= from) {
            return Err(SlotError::Upstream {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }

        Ok(self
            .offers
            .get(event_type)
            .map(|offers| {
                offers
                    .iter()
                    .filter(|o| o.start_time >= window.start && o.start_time < window.end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn credential_fingerprint(&self) -> u64 {
        self.fingerprint.load(Ordering::SeqCst)
    }
}
