//! Tests for day bucketing and per-specialist / per-language aggregation.

mod common;

use chrono::{Duration, NaiveDate};
use common::{at, specialist};
use slot_engine::aggregate::{
    bucket_by_day, distinct_local_times, language_day_counts, specialist_day_counts,
    summary_table,
};
use slot_engine::{count_bookable_slots, Cycle, Settings, TaggedSlot};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn slot(specialist: &str, start: &str) -> TaggedSlot {
    TaggedSlot {
        start: at(start),
        specialist: specialist.to_string(),
    }
}

/// Friday 13 March 2026, 08:00 UTC; cutoff is Saturday 05:00.
fn cycle() -> Cycle {
    Cycle::new(
        at("2026-03-13T08:00:00Z"),
        chrono_tz::Europe::London,
        &Settings::default(),
    )
}

fn two_hours() -> Duration {
    Duration::minutes(120)
}

// ── Bucketing ───────────────────────────────────────────────────────────────

#[test]
fn slots_inside_notice_are_dropped() {
    let buckets = bucket_by_day(&[slot("Dennis", "2026-03-13T15:00:00Z")], &cycle());
    assert!(buckets.is_empty());
}

#[test]
fn weekend_slots_are_dropped() {
    let buckets = bucket_by_day(&[slot("Dennis", "2026-03-14T10:00:00Z")], &cycle());
    assert!(buckets.is_empty());
}

#[test]
fn slots_past_the_horizon_are_dropped() {
    let buckets = bucket_by_day(&[slot("Dennis", "2026-04-02T10:00:00Z")], &cycle());
    assert!(buckets.is_empty());
}

#[test]
fn bucketing_uses_the_cycle_zone() {
    // 23:30 UTC Monday is Tuesday in Helsinki.
    let helsinki = Cycle::new(
        at("2026-03-13T08:00:00Z"),
        chrono_tz::Europe::Helsinki,
        &Settings::default(),
    );
    let slots = [slot("Dennis", "2026-03-16T23:30:00Z")];

    assert!(bucket_by_day(&slots, &cycle()).contains_key(&date("2026-03-16")));
    assert!(bucket_by_day(&slots, &helsinki).contains_key(&date("2026-03-17")));
}

// ── Counting ────────────────────────────────────────────────────────────────

#[test]
fn language_total_is_sum_of_independent_reductions_not_pooled() {
    let dennis = specialist("Dennis", &["German"]);
    let nina = specialist("Nina", &["German"]);
    let cycle = cycle();

    // Both specialists offer 09:00 and 09:30: each can take one appointment,
    // and they can run at the same time.
    let slots = vec![
        slot("Dennis", "2026-03-16T09:00:00Z"),
        slot("Dennis", "2026-03-16T09:30:00Z"),
        slot("Nina", "2026-03-16T09:00:00Z"),
        slot("Nina", "2026-03-16T09:30:00Z"),
    ];
    let buckets = bucket_by_day(&slots, &cycle);
    let names = vec!["Dennis".to_string(), "Nina".to_string()];
    let per_specialist = specialist_day_counts(&buckets, &names, &cycle.days, two_hours());
    let per_language = language_day_counts(&per_specialist, &[dennis, nina], &cycle.days);

    let monday = date("2026-03-16");
    assert_eq!(per_specialist["Dennis"][&monday], 1);
    assert_eq!(per_specialist["Nina"][&monday], 1);
    assert_eq!(per_language["German"][&monday], 2);

    let pooled: Vec<_> = slots.iter().map(|s| s.start).collect();
    assert_eq!(count_bookable_slots(&pooled, two_hours()), 1);
}

#[test]
fn rows_cover_every_horizon_day_with_zeros() {
    let cycle = cycle();
    let buckets = bucket_by_day(&[slot("Dennis", "2026-03-17T09:00:00Z")], &cycle);
    let names = vec!["Dennis".to_string(), "Harry".to_string()];
    let per_specialist = specialist_day_counts(&buckets, &names, &cycle.days, two_hours());

    assert_eq!(per_specialist["Dennis"].len(), cycle.days.len());
    assert_eq!(per_specialist["Dennis"][&date("2026-03-17")], 1);
    assert_eq!(per_specialist["Dennis"][&date("2026-03-16")], 0);
    assert!(per_specialist["Harry"].values().all(|c| *c == 0));
}

#[test]
fn specialist_counts_towards_every_language_they_speak() {
    let cycle = cycle();
    let harry = specialist("Harry", &["English", "French"]);
    let buckets = bucket_by_day(
        &[
            slot("Harry", "2026-03-16T09:00:00Z"),
            slot("Harry", "2026-03-16T13:00:00Z"),
        ],
        &cycle,
    );
    let names = vec!["Harry".to_string()];
    let per_specialist = specialist_day_counts(&buckets, &names, &cycle.days, two_hours());
    let per_language = language_day_counts(&per_specialist, &[harry], &cycle.days);

    let languages: Vec<&str> = per_language.keys().map(String::as_str).collect();
    assert_eq!(languages, vec!["English", "French"]);
    assert_eq!(per_language["English"][&date("2026-03-16")], 2);
    assert_eq!(per_language["French"][&date("2026-03-16")], 2);
}

#[test]
fn summary_is_day_ordered_and_sums_specialists() {
    let cycle = cycle();
    let buckets = bucket_by_day(
        &[
            slot("Nina", "2026-03-18T09:00:00Z"),
            slot("Dennis", "2026-03-16T09:00:00Z"),
            slot("Dennis", "2026-03-16T10:00:00Z"),
            slot("Dennis", "2026-03-16T11:00:00Z"),
            slot("Nina", "2026-03-16T09:00:00Z"),
        ],
        &cycle,
    );

    let summary = summary_table(&buckets, two_hours());
    let rows: Vec<(NaiveDate, usize)> = summary.iter().map(|r| (r.date, r.bookable)).collect();
    // Monday: Dennis 09:00 + 11:00, Nina 09:00. Wednesday: Nina 09:00.
    assert_eq!(rows, vec![(date("2026-03-16"), 3), (date("2026-03-18"), 1)]);
}

#[test]
fn distinct_times_are_local_deduplicated_and_sorted() {
    let paris = Cycle::new(
        at("2026-03-13T08:00:00Z"),
        chrono_tz::Europe::Paris,
        &Settings::default(),
    );
    let buckets = bucket_by_day(
        &[
            slot("Nina", "2026-03-16T10:00:00Z"),
            slot("Dennis", "2026-03-16T08:30:00Z"),
            slot("Dennis", "2026-03-16T10:00:00Z"),
        ],
        &paris,
    );

    let times = distinct_local_times(&buckets, &paris);
    assert_eq!(times[&date("2026-03-16")], vec!["09:30", "11:00"]);
}
