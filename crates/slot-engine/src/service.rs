//! Request-cycle entry points producing the dashboard's three views.
//!
//! Every call is a pure function of (roster, filter, zone, now) apart from
//! the fetch cache; nothing else survives between calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::aggregate::{
    bucket_by_day, distinct_local_times, language_day_counts, specialist_day_counts,
    summary_table, DayCounts, SummaryRow,
};
use crate::client::AvailabilitySource;
use crate::collector::{Collector, TaggedSlot};
use crate::error::Result;
use crate::fetcher::AvailabilityFetcher;
use crate::notice::{is_working_day, local_date, Cycle};
use crate::roster::Roster;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageDay {
    pub date: NaiveDate,
    /// Distinct local `HH:MM` start times.
    pub times: Vec<String>,
    pub bookable: usize,
}

/// Bookable availability for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageView {
    pub language: String,
    pub cycle: Cycle,
    /// Admissible slots on horizon days, sorted.
    pub slots: Vec<TaggedSlot>,
    /// Only days with at least one slot.
    pub days: Vec<LanguageDay>,
    pub degraded: Vec<String>,
}

impl LanguageView {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminDay {
    pub date: NaiveDate,
    /// Local `HH:MM` start times, ascending.
    pub times: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminSpecialist {
    pub name: String,
    /// Raw start-time options in the fetch window, weekends included.
    pub total_slots: usize,
    pub slots: Vec<DateTime<Utc>>,
    /// Working days only.
    pub days: Vec<AdminDay>,
}

/// Raw availability per specialist, unfiltered by notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminView {
    pub cycle: Cycle,
    pub specialists: Vec<AdminSpecialist>,
    pub degraded: Vec<String>,
}

/// Bookable counts per specialist and per language over the horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    pub cycle: Cycle,
    pub days: Vec<NaiveDate>,
    pub specialists: BTreeMap<String, DayCounts>,
    pub languages: BTreeMap<String, DayCounts>,
    pub totals: Vec<SummaryRow>,
    pub degraded: Vec<String>,
}

pub struct AvailabilityService {
    collector: Collector,
    settings: Settings,
}

impl AvailabilityService {
    pub fn new(source: Arc<dyn AvailabilitySource>, settings: Settings) -> Self {
        let fetcher = Arc::new(AvailabilityFetcher::new(
            source,
            settings.max_request_span,
            settings.cache_ttl,
        ));
        let collector = Collector::new(fetcher, settings.max_concurrency);
        Self {
            collector,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cycle(&self, now: DateTime<Utc>, timezone: Tz) -> Cycle {
        Cycle::new(now, timezone, &self.settings)
    }

    pub async fn language_view(
        &self,
        roster: &Roster,
        language: &str,
        timezone: Tz,
        now: DateTime<Utc>,
    ) -> Result<LanguageView> {
        let cycle = self.cycle(now, timezone);
        let participants = roster.participants(self.settings.team.as_deref());
        let collection = self
            .collector
            .collect_for_language(&participants, language, cycle.window)
            .await?;

        let buckets = bucket_by_day(&collection.slots, &cycle);
        let mut times = distinct_local_times(&buckets, &cycle);
        let days = summary_table(&buckets, self.settings.slot_duration)
            .into_iter()
            .map(|row| LanguageDay {
                date: row.date,
                times: times.remove(&row.date).unwrap_or_default(),
                bookable: row.bookable,
            })
            .collect();

        let slots = collection
            .slots
            .into_iter()
            .filter(|s| cycle.admits(s.start) && cycle.day_of(s.start).is_some())
            .collect();

        Ok(LanguageView {
            language: language.to_string(),
            cycle,
            slots,
            days,
            degraded: collection.degraded,
        })
    }

    pub async fn admin_view(&self, roster: &Roster, now: DateTime<Utc>) -> Result<AdminView> {
        let timezone = self.settings.admin_timezone;
        let cycle = self.cycle(now, timezone);
        let participants = roster.participants(self.settings.team.as_deref());
        let collection = self
            .collector
            .collect_for_all_specialists(&participants, cycle.window)
            .await?;

        let specialists = collection
            .by_specialist
            .into_iter()
            .map(|(name, slots)| {
                let mut by_day: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();
                for start in &slots {
                    let date = local_date(*start, timezone);
                    if is_working_day(date) {
                        by_day
                            .entry(date)
                            .or_default()
                            .push(start.with_timezone(&timezone).format("%H:%M").to_string());
                    }
                }
                AdminSpecialist {
                    name,
                    total_slots: slots.len(),
                    slots,
                    days: by_day
                        .into_iter()
                        .map(|(date, times)| AdminDay { date, times })
                        .collect(),
                }
            })
            .collect();

        Ok(AdminView {
            cycle,
            specialists,
            degraded: collection.degraded,
        })
    }

    pub async fn aggregate_report(
        &self,
        roster: &Roster,
        timezone: Tz,
        now: DateTime<Utc>,
    ) -> Result<AggregateReport> {
        let cycle = self.cycle(now, timezone);
        let participants = roster.participants(self.settings.team.as_deref());
        let collection = self
            .collector
            .collect_for_all_specialists(&participants, cycle.window)
            .await?;

        let tagged: Vec<TaggedSlot> = collection
            .by_specialist
            .iter()
            .flat_map(|(name, starts)| {
                starts.iter().map(move |start| TaggedSlot {
                    start: *start,
                    specialist: name.clone(),
                })
            })
            .collect();
        let buckets = bucket_by_day(&tagged, &cycle);

        let names: Vec<String> = participants.iter().map(|s| s.name.clone()).collect();
        let specialists =
            specialist_day_counts(&buckets, &names, &cycle.days, self.settings.slot_duration);
        let languages = language_day_counts(&specialists, &participants, &cycle.days);
        let totals = cycle
            .days
            .iter()
            .map(|date| SummaryRow {
                date: *date,
                bookable: specialists.values().filter_map(|row| row.get(date)).sum(),
            })
            .collect();

        Ok(AggregateReport {
            days: cycle.days.clone(),
            cycle,
            specialists,
            languages,
            totals,
            degraded: collection.degraded,
        })
    }
}
