//! Count booked appointments per specialist.
//!
//! Unlike availability, errors here are not failed open: a permission
//! problem on the organization-wide listing is reported to the caller, who
//! drops only this section of the report.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::client::{CalendlyClient, EventOwner};
use crate::error::Result;
use crate::notice::FetchWindow;
use crate::roster::Specialist;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookedCounts {
    pub window: FetchWindow,
    /// Every participant, zero when nothing is booked.
    pub by_specialist: BTreeMap<String, usize>,
    /// Events seen, including ones hosted by people outside the roster.
    pub events_seen: usize,
    pub records_skipped: usize,
}

/// `[now - lookback, now + lookahead)`.
pub fn booked_window(now: DateTime<Utc>, lookback: Duration, lookahead: Duration) -> FetchWindow {
    FetchWindow::new(now - lookback, now + lookahead)
}

pub async fn booked_counts(
    client: &CalendlyClient,
    participants: &[Specialist],
    owner: &EventOwner,
    window: FetchWindow,
) -> Result<BookedCounts> {
    let mut counts = BookedCounts {
        window,
        by_specialist: participants.iter().map(|s| (s.name.clone(), 0)).collect(),
        events_seen: 0,
        records_skipped: 0,
    };

    let mut token: Option<String> = None;
    loop {
        let page = client
            .scheduled_events(owner, window, token.as_deref())
            .await?;
        counts.records_skipped += page.skipped;

        for event in &page.items {
            counts.events_seen += 1;
            for specialist in participants {
                if event.is_hosted_by(&specialist.user_uri) {
                    *counts.by_specialist.entry(specialist.name.clone()).or_insert(0) += 1;
                }
            }
        }

        match page.next_page_token {
            Some(next) if token.as_deref() != Some(next.as_str()) => token = Some(next),
            _ => break,
        }
    }

    tracing::info!(
        events = counts.events_seen,
        skipped = counts.records_skipped,
        "counted booked events"
    );
    Ok(counts)
}
