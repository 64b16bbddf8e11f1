//! Roll reduced slot counts up per specialist, language and day.
//!
//! Each specialist's slots for a day are reduced on their own and only then
//! summed: two specialists can hold appointments at the same time, so
//! reducing a pooled list would undercount.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::collector::TaggedSlot;
use crate::notice::Cycle;
use crate::reducer::count_bookable_slots;
use crate::roster::Specialist;

/// Admissible starts grouped by horizon day, then by specialist.
pub type DayBuckets = BTreeMap<NaiveDate, BTreeMap<String, Vec<DateTime<Utc>>>>;

/// A count per horizon day, every horizon day present.
pub type DayCounts = BTreeMap<NaiveDate, usize>;

/// Keep admissible slots on horizon working days and group them.
pub fn bucket_by_day(slots: &[TaggedSlot], cycle: &Cycle) -> DayBuckets {
    let mut buckets = DayBuckets::new();
    for slot in slots {
        if !cycle.admits(slot.start) {
            continue;
        }
        if let Some(day) = cycle.day_of(slot.start) {
            buckets
                .entry(day)
                .or_default()
                .entry(slot.specialist.clone())
                .or_default()
                .push(slot.start);
        }
    }
    buckets
}

/// Bookable appointments per specialist per day.
///
/// Every specialist in `specialists` gets a full row over `days`, zero where
/// they have nothing.
pub fn specialist_day_counts(
    buckets: &DayBuckets,
    specialists: &[String],
    days: &[NaiveDate],
    slot_duration: Duration,
) -> BTreeMap<String, DayCounts> {
    specialists
        .iter()
        .map(|name| {
            let row = days
                .iter()
                .map(|day| {
                    let count = buckets
                        .get(day)
                        .and_then(|by_specialist| by_specialist.get(name))
                        .map(|starts| count_bookable_slots(starts, slot_duration))
                        .unwrap_or(0);
                    (*day, count)
                })
                .collect();
            (name.clone(), row)
        })
        .collect()
}

/// Sum per-specialist counts into one row per language.
pub fn language_day_counts(
    per_specialist: &BTreeMap<String, DayCounts>,
    specialists: &[Specialist],
    days: &[NaiveDate],
) -> BTreeMap<String, DayCounts> {
    let mut languages: BTreeMap<String, DayCounts> = BTreeMap::new();

    for specialist in specialists {
        for language in &specialist.languages {
            let row = languages
                .entry(language.clone())
                .or_insert_with(|| days.iter().map(|d| (*d, 0)).collect());
            if let Some(counts) = per_specialist.get(&specialist.name) {
                for (day, count) in counts {
                    *row.entry(*day).or_insert(0) += count;
                }
            }
        }
    }

    languages
}

/// One line of a day-ordered summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub date: NaiveDate,
    pub bookable: usize,
}

/// Total bookable appointments per day across `buckets`.
pub fn summary_table(buckets: &DayBuckets, slot_duration: Duration) -> Vec<SummaryRow> {
    buckets
        .iter()
        .map(|(date, by_specialist)| SummaryRow {
            date: *date,
            bookable: by_specialist
                .values()
                .map(|starts| count_bookable_slots(starts, slot_duration))
                .sum(),
        })
        .collect()
}

/// Distinct local `HH:MM` start times offered on each day, sorted.
pub fn distinct_local_times(buckets: &DayBuckets, cycle: &Cycle) -> BTreeMap<NaiveDate, Vec<String>> {
    buckets
        .iter()
        .map(|(date, by_specialist)| {
            let times: BTreeSet<String> = by_specialist
                .values()
                .flatten()
                .map(|start| {
                    start
                        .with_timezone(&cycle.timezone)
                        .format("%H:%M")
                        .to_string()
                })
                .collect();
            (*date, times.into_iter().collect())
        })
        .collect()
}
