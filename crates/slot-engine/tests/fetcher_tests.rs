//! Tests for span splitting, fail-open windows and memoization.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use common::{at, specialist, StubSource};
use slot_engine::{AvailabilityFetcher, FetchWindow, SlotError};

fn fetcher(source: Arc<StubSource>) -> AvailabilityFetcher {
    AvailabilityFetcher::new(source, Duration::days(7), StdDuration::from_secs(600))
}

fn ten_days() -> FetchWindow {
    FetchWindow::new(at("2026-03-09T00:00:00Z"), at("2026-03-19T00:00:00Z"))
}

#[tokio::test]
async fn split_fetch_matches_a_single_unbounded_call() {
    let dennis = specialist("Dennis", &["English"]);
    let offers = [
        "2026-03-09T09:00:00Z",
        "2026-03-12T14:30:00Z",
        "2026-03-15T23:59:00Z",
        "2026-03-16T00:00:00Z", // first instant of the second piece
        "2026-03-18T16:00:00Z",
    ];
    let source = Arc::new(StubSource::new().offer(&dennis, &offers));

    let split = fetcher(source.clone())
        .fetch(&dennis.event_type_uri, ten_days())
        .await
        .unwrap();

    let unbounded = AvailabilityFetcher::new(
        source.clone(),
        Duration::days(365),
        StdDuration::from_secs(600),
    )
    .fetch(&dennis.event_type_uri, ten_days())
    .await
    .unwrap();

    let split_set: BTreeSet<_> = split.starts.iter().copied().collect();
    let unbounded_set: BTreeSet<_> = unbounded.starts.iter().copied().collect();
    assert_eq!(split_set, unbounded_set);
    assert_eq!(split_set.len(), offers.len());
    assert_eq!(split.requested_windows, 2);
    assert_eq!(unbounded.requested_windows, 1);
}

#[tokio::test]
async fn requests_never_exceed_the_max_span() {
    let dennis = specialist("Dennis", &["English"]);
    let source = Arc::new(StubSource::new());

    fetcher(source.clone())
        .fetch(&dennis.event_type_uri, ten_days())
        .await
        .unwrap();

    let windows = source.windows();
    assert_eq!(windows.len(), 2);
    for (_, window) in &windows {
        assert!(window.end - window.start <= Duration::days(7));
    }
    assert_eq!(windows[0].1.start, ten_days().start);
    assert_eq!(windows[0].1.end, windows[1].1.start);
    assert_eq!(windows[1].1.end, ten_days().end);
}

#[tokio::test]
async fn only_available_records_are_kept() {
    let dennis = specialist("Dennis", &["English"]);
    let source = Arc::new(
        StubSource::new()
            .offer(&dennis, &["2026-03-10T09:00:00Z"])
            .offer_status(&dennis, "2026-03-10T11:00:00Z", "unavailable"),
    );

    let outcome = fetcher(source)
        .fetch(&dennis.event_type_uri, ten_days())
        .await
        .unwrap();
    assert_eq!(outcome.starts, vec![at("2026-03-10T09:00:00Z")]);
}

#[tokio::test]
async fn failed_window_is_empty_and_flagged() {
    let dennis = specialist("Dennis", &["English"]);
    let source = Arc::new(
        StubSource::new()
            .offer(&dennis, &["2026-03-10T09:00:00Z", "2026-03-17T09:00:00Z"])
            .failing_from("2026-03-16T00:00:00Z"),
    );

    let outcome = fetcher(source)
        .fetch(&dennis.event_type_uri, ten_days())
        .await
        .unwrap();

    assert_eq!(outcome.starts, vec![at("2026-03-10T09:00:00Z")]);
    assert_eq!(outcome.failed_windows, 1);
    assert!(outcome.is_degraded());
}

#[tokio::test]
async fn rejected_credential_aborts_the_fetch() {
    let dennis = specialist("Dennis", &["English"]);
    let source = Arc::new(StubSource::new().rejecting_credential());

    let err = fetcher(source)
        .fetch(&dennis.event_type_uri, ten_days())
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::InvalidCredential));
}

#[tokio::test]
async fn repeated_fetch_is_served_from_cache() {
    let dennis = specialist("Dennis", &["English"]);
    let source = Arc::new(StubSource::new().offer(&dennis, &["2026-03-10T09:00:00Z"]));
    let fetcher = fetcher(source.clone());

    let first = fetcher.fetch(&dennis.event_type_uri, ten_days()).await.unwrap();
    let calls_after_first = source.calls();
    let second = fetcher.fetch(&dennis.event_type_uri, ten_days()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(source.calls(), calls_after_first);
}

#[tokio::test]
async fn different_window_is_not_served_from_cache() {
    let dennis = specialist("Dennis", &["English"]);
    let source = Arc::new(StubSource::new());
    let fetcher = fetcher(source.clone());

    fetcher.fetch(&dennis.event_type_uri, ten_days()).await.unwrap();
    let shifted = FetchWindow::new(at("2026-03-09T00:10:00Z"), at("2026-03-19T00:10:00Z"));
    fetcher.fetch(&dennis.event_type_uri, shifted).await.unwrap();

    assert_eq!(source.calls(), 4);
}

#[tokio::test]
async fn degraded_result_is_not_cached() {
    let dennis = specialist("Dennis", &["English"]);
    let source = Arc::new(StubSource::new().failing(&dennis));
    let fetcher = fetcher(source.clone());

    fetcher.fetch(&dennis.event_type_uri, ten_days()).await.unwrap();
    fetcher.fetch(&dennis.event_type_uri, ten_days()).await.unwrap();

    assert_eq!(source.calls(), 4);
}

#[tokio::test]
async fn zero_ttl_disables_memoization() {
    let dennis = specialist("Dennis", &["English"]);
    let source = Arc::new(StubSource::new());
    let fetcher = AvailabilityFetcher::new(source.clone(), Duration::days(7), StdDuration::ZERO);

    fetcher.fetch(&dennis.event_type_uri, ten_days()).await.unwrap();
    fetcher.fetch(&dennis.event_type_uri, ten_days()).await.unwrap();

    assert_eq!(source.calls(), 4);
}

#[tokio::test]
async fn rotated_credential_is_not_served_from_cache() {
    let dennis = specialist("Dennis", &["English"]);
    let source = Arc::new(StubSource::new().with_fingerprint(1));
    let fetcher = fetcher(source.clone());

    fetcher.fetch(&dennis.event_type_uri, ten_days()).await.unwrap();
    source.rotate_credential(2);
    fetcher.fetch(&dennis.event_type_uri, ten_days()).await.unwrap();

    assert_eq!(source.calls(), 4);
}
