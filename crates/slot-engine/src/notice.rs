//! Notice and working-calendar rules.
//!
//! A cycle captures `now` once, floors it to the configured quantum, and
//! derives everything else (notice cutoff, horizon, upstream query window)
//! from that single value so repeated cycles inside one quantum agree.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Slots must start at or after `now + notice`.
pub fn admissible(instant: DateTime<Utc>, now: DateTime<Utc>, notice: Duration) -> bool {
    instant >= saturating_add(now, notice)
}

/// The calendar date of `instant` as seen in `tz`.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Monday through Friday. No holiday calendar.
pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Floor `now` to a multiple of `quantum` since the Unix epoch.
pub fn quantize(now: DateTime<Utc>, quantum: Duration) -> DateTime<Utc> {
    let step = quantum.num_milliseconds();
    if step <= 0 {
        return now;
    }
    let millis = now.timestamp_millis();
    let floored = millis - millis.rem_euclid(step);
    DateTime::<Utc>::from_timestamp_millis(floored).unwrap_or(now)
}

/// The first `working_days` working dates on or after `today`.
pub fn horizon(today: NaiveDate, working_days: u32) -> Vec<NaiveDate> {
    today
        .iter_days()
        .filter(|d| is_working_day(*d))
        .take(working_days as usize)
        .collect()
}

/// A half-open `[start, end)` range sent to the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Split into consecutive windows of at most `max_span` each.
    ///
    /// The pieces tile the window exactly; the last one may be shorter.
    pub fn split(&self, max_span: Duration) -> Vec<FetchWindow> {
        let mut pieces = Vec::new();
        if max_span <= Duration::zero() {
            return pieces;
        }
        let mut cursor = self.start;
        while cursor < self.end {
            let next = (cursor + max_span).min(self.end);
            pieces.push(FetchWindow::new(cursor, next));
            cursor = next;
        }
        pieces
    }
}

/// Everything one request cycle derives from its single `now`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    /// Quantized `now`.
    pub now: DateTime<Utc>,
    /// Earliest admissible slot start.
    pub cutoff: DateTime<Utc>,
    /// Working dates retained, in the cycle's time zone.
    pub days: Vec<NaiveDate>,
    /// Upstream query window covering `days` plus padding.
    pub window: FetchWindow,
    #[serde(serialize_with = "serialize_tz")]
    pub timezone: Tz,
}

impl Cycle {
    pub fn new(now: DateTime<Utc>, timezone: Tz, settings: &Settings) -> Self {
        let now = quantize(now, settings.now_quantum);
        let today = local_date(now, timezone);
        let days = horizon(today, settings.working_days);

        let span_days = days
            .last()
            .map(|last| (*last - today).num_days() + 1)
            .unwrap_or(0);
        let start = saturating_add(now, Duration::minutes(1));
        let padded = Duration::try_days(span_days + i64::from(settings.padding_days))
            .unwrap_or(Duration::MAX);
        let end = saturating_add(start, padded);

        Self {
            now,
            cutoff: saturating_add(now, settings.minimum_notice),
            days,
            window: FetchWindow::new(start, end),
            timezone,
        }
    }

    pub fn admits(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.cutoff
    }

    /// The horizon date `instant` falls on, if any.
    pub fn day_of(&self, instant: DateTime<Utc>) -> Option<NaiveDate> {
        let date = local_date(instant, self.timezone);
        self.days.binary_search(&date).ok().map(|_| date)
    }
}

/// `instant + delta`, pinned to the representable range.
fn saturating_add(instant: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    instant.checked_add_signed(delta).unwrap_or(if delta < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

fn serialize_tz<S: serde::Serializer>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(tz.name())
}
