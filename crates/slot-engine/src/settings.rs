//! Business-rule settings for an availability cycle.
//!
//! Defaults mirror the dashboard's production constants. Every value can be
//! overridden through a `SLOTS_*` environment variable; unparsable values are
//! rejected instead of silently falling back to the default.

use std::str::FromStr;

use chrono::Duration;
use chrono_tz::Tz;

use crate::error::{Result, SlotError};

pub const DEFAULT_TEAM: &str = "EMEA";

/// About a year of Mon–Fri days.
const MAX_WORKING_DAYS: u32 = 260;
const MAX_PADDING_DAYS: u32 = 366;
const MAX_REQUEST_SPAN_DAYS: i64 = 31;
const MAX_MINIMUM_NOTICE_DAYS: i64 = 366;

/// Friendly labels offered for the display time zone, in menu order.
pub const TIMEZONE_PRESETS: &[(&str, &str)] = &[
    ("GMT / BST (London, Dublin)", "Europe/London"),
    ("CET (Paris, Berlin, Rome)", "Europe/Paris"),
    ("EET (Athens, Helsinki)", "Europe/Helsinki"),
    ("GST (Dubai, Abu Dhabi)", "Asia/Dubai"),
    ("EST (New York, Toronto)", "America/New_York"),
    ("CST (Chicago, Mexico City)", "America/Chicago"),
    ("MST (Denver, Phoenix)", "America/Denver"),
    ("PST (Los Angeles, Vancouver)", "America/Los_Angeles"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Number of working days (Mon–Fri) shown ahead, today included.
    pub working_days: u32,
    /// Slots starting earlier than `now + minimum_notice` are not bookable.
    pub minimum_notice: Duration,
    /// Fixed length of one appointment.
    pub slot_duration: Duration,
    /// Extra calendar days fetched past the horizon's last day.
    pub padding_days: u32,
    /// Largest span the upstream accepts in one availability request.
    pub max_request_span: Duration,
    /// Lifetime of memoized fetch results.
    pub cache_ttl: std::time::Duration,
    /// `now` is floored to a multiple of this so fetch windows repeat.
    pub now_quantum: Duration,
    /// Upper bound on concurrent per-specialist fetches.
    pub max_concurrency: usize,
    /// Team reported on; `None` reports every team.
    pub team: Option<String>,
    pub display_timezone: Tz,
    pub admin_timezone: Tz,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            working_days: 14,
            minimum_notice: Duration::hours(21),
            slot_duration: Duration::minutes(120),
            padding_days: 7,
            max_request_span: Duration::days(7),
            cache_ttl: std::time::Duration::from_secs(600),
            now_quantum: Duration::minutes(10),
            max_concurrency: 8,
            team: Some(DEFAULT_TEAM.to_string()),
            display_timezone: chrono_tz::Europe::London,
            admin_timezone: chrono_tz::Europe::London,
        }
    }
}

impl Settings {
    /// Defaults overridden by `SLOTS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(v) = parse_var::<u32, _>(&lookup, "SLOTS_WORKING_DAYS")? {
            settings.working_days = v;
        }
        if let Some(v) = parse_var::<i64, _>(&lookup, "SLOTS_MINIMUM_NOTICE_HOURS")? {
            settings.minimum_notice =
                duration_var("SLOTS_MINIMUM_NOTICE_HOURS", Duration::try_hours(v))?;
        }
        if let Some(v) = parse_var::<i64, _>(&lookup, "SLOTS_SLOT_DURATION_MINUTES")? {
            settings.slot_duration =
                duration_var("SLOTS_SLOT_DURATION_MINUTES", Duration::try_minutes(v))?;
        }
        if let Some(v) = parse_var::<u32, _>(&lookup, "SLOTS_PADDING_DAYS")? {
            settings.padding_days = v;
        }
        if let Some(v) = parse_var::<i64, _>(&lookup, "SLOTS_MAX_REQUEST_SPAN_DAYS")? {
            settings.max_request_span =
                duration_var("SLOTS_MAX_REQUEST_SPAN_DAYS", Duration::try_days(v))?;
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "SLOTS_CACHE_TTL_SECONDS")? {
            settings.cache_ttl = std::time::Duration::from_secs(v);
        }
        if let Some(v) = parse_var::<i64, _>(&lookup, "SLOTS_NOW_QUANTUM_MINUTES")? {
            settings.now_quantum =
                duration_var("SLOTS_NOW_QUANTUM_MINUTES", Duration::try_minutes(v))?;
        }
        if let Some(v) = parse_var::<usize, _>(&lookup, "SLOTS_MAX_CONCURRENCY")? {
            settings.max_concurrency = v;
        }
        if let Some(team) = lookup("SLOTS_TEAM") {
            let team = team.trim();
            settings.team = (!team.is_empty()).then(|| team.to_string());
        }
        if let Some(tz) = lookup("SLOTS_DISPLAY_TIMEZONE") {
            settings.display_timezone = parse_timezone(&tz)?;
        }
        if let Some(tz) = lookup("SLOTS_ADMIN_TIMEZONE") {
            settings.admin_timezone = parse_timezone(&tz)?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_WORKING_DAYS).contains(&self.working_days) {
            return Err(invalid(
                "working_days",
                &format!("must be between 1 and {}", MAX_WORKING_DAYS),
            ));
        }
        if self.padding_days > MAX_PADDING_DAYS {
            return Err(invalid(
                "padding_days",
                &format!("must be at most {}", MAX_PADDING_DAYS),
            ));
        }
        if self.slot_duration <= Duration::zero() || self.slot_duration > Duration::days(1) {
            return Err(invalid("slot_duration", "must be positive and at most one day"));
        }
        if self.minimum_notice < Duration::zero()
            || self.minimum_notice > Duration::days(MAX_MINIMUM_NOTICE_DAYS)
        {
            return Err(invalid(
                "minimum_notice",
                &format!("must be between 0 and {} days", MAX_MINIMUM_NOTICE_DAYS),
            ));
        }
        if self.max_request_span <= Duration::zero()
            || self.max_request_span > Duration::days(MAX_REQUEST_SPAN_DAYS)
        {
            return Err(invalid(
                "max_request_span",
                &format!("must be positive and at most {} days", MAX_REQUEST_SPAN_DAYS),
            ));
        }
        if self.now_quantum <= Duration::zero() || self.now_quantum > Duration::days(1) {
            return Err(invalid("now_quantum", "must be positive and at most one day"));
        }
        if self.max_concurrency == 0 {
            return Err(invalid("max_concurrency", "must be at least 1"));
        }
        Ok(())
    }
}

/// Parse an IANA zone name such as `Europe/Paris`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    Tz::from_str(name.trim()).map_err(|_| SlotError::InvalidTimezone(name.to_string()))
}

/// Resolve either an IANA name or one of the [`TIMEZONE_PRESETS`] labels.
pub fn resolve_timezone(name_or_label: &str) -> Result<Tz> {
    TIMEZONE_PRESETS
        .iter()
        .find(|(label, _)| *label == name_or_label)
        .map(|(_, iana)| parse_timezone(iana))
        .unwrap_or_else(|| parse_timezone(name_or_label))
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(name, &e.to_string())),
    }
}

fn duration_var(name: &str, duration: Option<Duration>) -> Result<Duration> {
    duration.ok_or_else(|| invalid(name, "out of range"))
}

fn invalid(name: &str, reason: &str) -> SlotError {
    SlotError::InvalidSetting {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
