//! Reduce candidate start times to a count of bookable appointments.
//!
//! The upstream offers start-time options at a fine granularity, so one wide
//! free stretch shows up as many overlapping candidates. Counting them raw
//! overstates capacity. Greedy earliest-start packing gives the maximum
//! number of non-overlapping fixed-length appointments.

use chrono::{DateTime, Duration, Utc};

/// Count non-overlapping appointments of `slot_duration` that can start at
/// one of `starts`. Input order is irrelevant.
///
/// A candidate is taken when it starts at or after the end of the last taken
/// appointment, so back-to-back appointments both count.
pub fn count_bookable_slots(starts: &[DateTime<Utc>], slot_duration: Duration) -> usize {
    bookable_starts(starts, slot_duration).len()
}

/// The start times chosen by [`count_bookable_slots`], ascending.
pub fn bookable_starts(starts: &[DateTime<Utc>], slot_duration: Duration) -> Vec<DateTime<Utc>> {
    let mut sorted = starts.to_vec();
    sorted.sort_unstable();

    let mut chosen = Vec::new();
    let mut last_booked_end = DateTime::<Utc>::MIN_UTC;

    for start in sorted {
        if start >= last_booked_end {
            chosen.push(start);
            last_booked_end = start
                .checked_add_signed(slot_duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
        }
    }

    chosen
}
