//! Plain-text tables for the terminal.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;
use slot_engine::aggregate::DayCounts;
use slot_engine::booked::BookedCounts;
use slot_engine::records::{EventType, OrganizationMembership};
use slot_engine::service::{AdminView, AggregateReport, LanguageView};
use slot_engine::{Roster, Settings};

fn long_date(date: NaiveDate) -> String {
    date.format("%A, %-d %B %Y").to_string()
}

fn short_date(date: NaiveDate) -> String {
    date.format("%a %d").to_string()
}

fn degraded_note(out: &mut String, degraded: &[String]) {
    if !degraded.is_empty() {
        let _ = writeln!(
            out,
            "\nNote: availability could not be fully fetched for {}; figures may be low.",
            degraded.join(", ")
        );
    }
}

pub fn language(view: &LanguageView, settings: &Settings) -> String {
    let mut out = String::new();
    if view.is_empty() {
        let _ = writeln!(
            out,
            "No bookable {} slots in the next {} working days.",
            view.language, settings.working_days
        );
        degraded_note(&mut out, &view.degraded);
        return out;
    }

    let _ = writeln!(
        out,
        "Available {} slots (times in {})",
        view.language,
        view.cycle.timezone.name()
    );
    for day in &view.days {
        let _ = writeln!(out, "\n{}", long_date(day.date));
        let _ = writeln!(out, "  {}", day.times.join("  "));
    }

    let _ = writeln!(
        out,
        "\n{:<28} Bookable {}-minute slots",
        "Date",
        settings.slot_duration.num_minutes()
    );
    for day in &view.days {
        let _ = writeln!(out, "{:<28} {}", long_date(day.date), day.bookable);
    }
    degraded_note(&mut out, &view.degraded);
    out
}

pub fn admin(view: &AdminView) -> String {
    let mut out = String::new();
    if view.specialists.is_empty() {
        let _ = writeln!(out, "No specialists take part in the current roster.");
        return out;
    }

    let _ = writeln!(
        out,
        "Raw availability per specialist (times in {})",
        view.cycle.timezone.name()
    );
    for specialist in &view.specialists {
        let _ = writeln!(
            out,
            "\n{} ({} start options)",
            specialist.name, specialist.total_slots
        );
        if specialist.days.is_empty() {
            let _ = writeln!(out, "  no availability on working days");
        }
        for day in &specialist.days {
            let _ = writeln!(out, "  {:<12} {}", short_date(day.date), day.times.join(" "));
        }
    }
    degraded_note(&mut out, &view.degraded);
    out
}

pub fn report(report: &AggregateReport, settings: &Settings) -> String {
    let mut out = String::new();
    if report.specialists.is_empty() {
        let _ = writeln!(out, "No specialists take part in the current roster.");
        return out;
    }

    let label_width = report
        .specialists
        .keys()
        .chain(report.languages.keys())
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Total".len());

    let _ = writeln!(
        out,
        "Bookable {}-minute slots per day (days in {})",
        settings.slot_duration.num_minutes(),
        report.cycle.timezone.name()
    );
    let mut header = format!("{:<label_width$}", "");
    for date in &report.days {
        let _ = write!(header, " {:>6}", short_date(*date));
    }
    let _ = writeln!(out, "\n{}", header.trim_end());

    count_rows(&mut out, "Languages", &report.languages, &report.days, label_width);
    count_rows(&mut out, "Specialists", &report.specialists, &report.days, label_width);

    let mut line = format!("{:<label_width$}", "Total");
    for row in &report.totals {
        let _ = write!(line, " {:>6}", row.bookable);
    }
    let _ = writeln!(out, "{}", line);
    degraded_note(&mut out, &report.degraded);
    out
}

fn count_rows(
    out: &mut String,
    title: &str,
    rows: &BTreeMap<String, DayCounts>,
    days: &[NaiveDate],
    label_width: usize,
) {
    let _ = writeln!(out, "{}", title);
    for (name, counts) in rows {
        let mut line = format!("{:<label_width$}", name);
        for date in days {
            let _ = write!(line, " {:>6}", counts.get(date).copied().unwrap_or(0));
        }
        let _ = writeln!(out, "{}", line);
    }
}

pub fn booked(counts: &BookedCounts) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Booked appointments from {} to {}",
        counts.window.start.format("%Y-%m-%d %H:%M UTC"),
        counts.window.end.format("%Y-%m-%d %H:%M UTC")
    );
    if counts.by_specialist.is_empty() {
        let _ = writeln!(out, "No specialists take part in the current roster.");
        return out;
    }
    for (name, booked) in &counts.by_specialist {
        let _ = writeln!(out, "  {:<24} {}", name, booked);
    }
    let _ = writeln!(out, "{} events listed", counts.events_seen);
    if counts.records_skipped > 0 {
        let _ = writeln!(out, "{} unreadable events skipped", counts.records_skipped);
    }
    out
}

pub fn event_types(types: &[EventType]) -> String {
    let mut out = String::new();
    if types.is_empty() {
        let _ = writeln!(out, "No event types found.");
        return out;
    }
    for event_type in types {
        let duration = event_type
            .duration
            .map(|m| format!("{} min", m))
            .unwrap_or_default();
        let state = if event_type.active { "" } else { " (inactive)" };
        let _ = writeln!(out, "{}{} {}", event_type.name, state, duration);
        let _ = writeln!(out, "  {}", event_type.uri);
    }
    out
}

pub fn members(members: &[OrganizationMembership]) -> String {
    let mut out = String::new();
    if members.is_empty() {
        let _ = writeln!(out, "No organization members found.");
        return out;
    }
    for member in members {
        let role = member.role.as_deref().unwrap_or("member");
        let _ = writeln!(out, "{} ({})", member.user.name, role);
        let _ = writeln!(out, "  {}", member.user.uri);
    }
    out
}

pub fn roster(roster: &Roster, team: Option<&str>) -> String {
    let mut out = String::new();
    let participants = roster.participants(team);
    match team {
        Some(team) => {
            let _ = writeln!(out, "{} specialists take part in team {}", participants.len(), team);
        }
        None => {
            let _ = writeln!(out, "{} specialists take part", participants.len());
        }
    }
    for specialist in &participants {
        let languages: Vec<&str> = specialist.languages.iter().map(String::as_str).collect();
        let _ = writeln!(out, "  {:<24} {}", specialist.name, languages.join(", "));
    }
    let languages = roster.languages(team);
    if !languages.is_empty() {
        let _ = writeln!(out, "Languages: {}", languages.join(", "));
    }
    for warning in roster.warnings() {
        let _ = writeln!(out, "Excluded {}: {}", warning.name, warning.reason);
    }
    out
}
