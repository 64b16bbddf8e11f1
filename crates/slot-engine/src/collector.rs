//! Fan the fetcher out across specialists with a concurrency cap.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::Result;
use crate::fetcher::{AvailabilityFetcher, FetchOutcome};
use crate::notice::FetchWindow;
use crate::roster::Specialist;

/// An available start time and the specialist offering it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TaggedSlot {
    pub start: DateTime<Utc>,
    pub specialist: String,
}

/// Flattened slots for everyone speaking one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LanguageCollection {
    pub language: String,
    /// Sorted by start, then specialist.
    pub slots: Vec<TaggedSlot>,
    /// Specialists whose data is partial or missing.
    pub degraded: Vec<String>,
}

/// Raw slots per specialist, every fetched specialist present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterCollection {
    /// Each list sorted ascending.
    pub by_specialist: BTreeMap<String, Vec<DateTime<Utc>>>,
    pub degraded: Vec<String>,
}

pub struct Collector {
    fetcher: Arc<AvailabilityFetcher>,
    max_concurrency: usize,
}

impl Collector {
    pub fn new(fetcher: Arc<AvailabilityFetcher>, max_concurrency: usize) -> Self {
        Self {
            fetcher,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Tagged slots of every participating specialist speaking `language`.
    pub async fn collect_for_language(
        &self,
        specialists: &[Specialist],
        language: &str,
        window: FetchWindow,
    ) -> Result<LanguageCollection> {
        let speakers: Vec<&Specialist> = specialists
            .iter()
            .filter(|s| s.participates() && s.speaks(language))
            .collect();
        tracing::info!(language, specialists = speakers.len(), "collecting availability");

        let (outcomes, degraded) = self.fetch_all(&speakers, window).await?;

        let mut slots: Vec<TaggedSlot> = outcomes
            .into_iter()
            .flat_map(|(name, starts)| {
                starts.into_iter().map(move |start| TaggedSlot {
                    start,
                    specialist: name.clone(),
                })
            })
            .collect();
        slots.sort();

        Ok(LanguageCollection {
            language: language.to_string(),
            slots,
            degraded,
        })
    }

    /// Raw slots of every participating specialist, regardless of language.
    pub async fn collect_for_all_specialists(
        &self,
        specialists: &[Specialist],
        window: FetchWindow,
    ) -> Result<RosterCollection> {
        let participants: Vec<&Specialist> =
            specialists.iter().filter(|s| s.participates()).collect();
        tracing::info!(specialists = participants.len(), "collecting availability");

        let (outcomes, degraded) = self.fetch_all(&participants, window).await?;

        let by_specialist = outcomes
            .into_iter()
            .map(|(name, mut starts)| {
                starts.sort();
                (name, starts)
            })
            .collect();

        Ok(RosterCollection {
            by_specialist,
            degraded,
        })
    }

    /// Fetch every specialist concurrently. A specialist that fails yields an
    /// empty list and lands in the degraded list; a configuration error
    /// aborts the whole collection.
    async fn fetch_all(
        &self,
        specialists: &[&Specialist],
        window: FetchWindow,
    ) -> Result<(Vec<(String, Vec<DateTime<Utc>>)>, Vec<String>)> {
        let fetcher = &self.fetcher;
        let results: Vec<(String, Result<FetchOutcome>)> = stream::iter(specialists.iter())
            .map(|specialist| async move {
                let outcome = fetcher.fetch(&specialist.event_type_uri, window).await;
                (specialist.name.clone(), outcome)
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut outcomes = Vec::with_capacity(results.len());
        let mut degraded = Vec::new();

        for (name, result) in results {
            match result {
                Ok(outcome) => {
                    if outcome.is_degraded() {
                        tracing::warn!(
                            specialist = %name,
                            failed = outcome.failed_windows,
                            of = outcome.requested_windows,
                            "partial availability"
                        );
                        degraded.push(name.clone());
                    }
                    outcomes.push((name, outcome.starts));
                }
                Err(e) if e.is_configuration() => return Err(e),
                Err(e) => {
                    tracing::warn!(specialist = %name, error = %e, "availability fetch failed");
                    degraded.push(name.clone());
                    outcomes.push((name, Vec::new()));
                }
            }
        }

        degraded.sort();
        Ok((outcomes, degraded))
    }
}
