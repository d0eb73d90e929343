//! Text rendering of everything the cli prints. Functions return strings and take the time zone
//! explicitly so that output can be checked in tests.

use std::fmt::Write;

use ansi_term::Colour;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use prettytable::{
    format::{FormatBuilder, LinePosition, LineSeparator},
    Cell, Row, Table,
};

use crate::{
    tracker::{
        entities::{User, Workday},
        summary::{DaySummary, PeriodSummary},
        Tracker, WorkdayStatus,
    },
    utils::time::{format_clock, format_hms},
};

const NO_TIME: &str = "--:--:--";
const NOT_AVAILABLE: &str = "N/A";

/// Borderless table with a dashed line under the titles.
fn new_table(titles: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(
        FormatBuilder::new()
            .column_separator(' ')
            .separator(LinePosition::Title, LineSeparator::new('-', ' ', ' ', ' '))
            .padding(0, 1)
            .build(),
    );
    table.set_titles(Row::new(titles.iter().map(|v| Cell::new(v)).collect()));
    table
}

fn push_row<S: AsRef<str>>(table: &mut Table, cells: impl IntoIterator<Item = S>) {
    table.add_row(Row::new(
        cells.into_iter().map(|v| Cell::new(v.as_ref())).collect(),
    ));
}

pub fn paint_status(status: WorkdayStatus, text: &str) -> String {
    let colour = match status {
        WorkdayStatus::Idle => Colour::Blue,
        WorkdayStatus::Working => Colour::Green,
        WorkdayStatus::OnBreak => Colour::Yellow,
        WorkdayStatus::Finished => Colour::Purple,
    };
    colour.bold().paint(text).to_string()
}

/// Overview of today: status, times, totals, what can be done next and the log.
pub fn render_status<Tz: TimeZone>(tracker: &Tracker, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let workday = tracker.workday();
    let mut out = String::new();
    let _ = writeln!(out, "{}", tracker.status_message());
    let _ = writeln!(out, "Date:            {}", workday.date.format("%Y-%m-%d"));
    let _ = writeln!(out, "Start:           {}", format_clock(workday.start_time, tz, NO_TIME));
    let _ = writeln!(out, "End:             {}", format_clock(workday.end_time, tz, NO_TIME));
    let _ = writeln!(out, "Effective work:  {}", format_hms(tracker.effective_work(now)));
    let _ = writeln!(out, "Total break:     {}", format_hms(tracker.total_break_at(now)));

    let actions = tracker.available_actions();
    let available = [
        (actions.start, "start"),
        (actions.start_break, "break"),
        (actions.end_break, "resume"),
        (actions.end, "end"),
        (actions.reset, "reset"),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .map(|(_, name)| name)
    .collect::<Vec<_>>();
    let _ = writeln!(out, "Available:       {}", available.join(", "));

    if !workday.events.is_empty() {
        out.push('\n');
        out.push_str(&render_events(workday, tz).to_string());
    }
    out
}

fn render_events<Tz: TimeZone>(workday: &Workday, tz: &Tz) -> Table
where
    Tz::Offset: std::fmt::Display,
{
    let mut table = new_table(&["Event", "Time", "Duration"]);
    for event in &workday.events {
        push_row(&mut table, [
            event.event.label().to_string(),
            format_clock(Some(event.time), tz, NO_TIME),
            match event.duration {
                Some(v) if !v.is_zero() => format_hms(v),
                _ => "--".into(),
            },
        ]);
    }
    table
}

/// Event log of a single day followed by its summary.
pub fn render_day<Tz: TimeZone>(date: NaiveDate, workday: Option<&Workday>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let Some(workday) = workday else {
        return "No records for this date.\n".into();
    };
    let summary = DaySummary::from(workday);
    let mut out = String::new();
    let _ = writeln!(out, "Records for {}", date.format("%Y-%m-%d"));
    out.push('\n');
    out.push_str(&render_events(workday, tz).to_string());
    out.push('\n');
    let _ = writeln!(out, "Day summary:");
    let _ = writeln!(out, "  Work start:      {}", format_clock(summary.start, tz, NOT_AVAILABLE));
    let _ = writeln!(out, "  Work end:        {}", format_clock(summary.end, tz, NOT_AVAILABLE));
    let _ = writeln!(out, "  Effective work:  {}", format_hms(summary.work));
    let _ = writeln!(out, "  Total break:     {}", format_hms(summary.breaks));
    out
}

/// Table of days of a week or month with totals.
pub fn render_period<Tz: TimeZone>(summary: &PeriodSummary, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if summary.is_empty() {
        return format!("No records for this {}.\n", summary.period);
    }
    let mut table = new_table(&["Date", "Start", "End", "Effective work", "Total break"]);
    for day in &summary.days {
        push_row(&mut table, day_row(day, tz));
    }
    let mut out = String::new();
    let _ = writeln!(out, "{}", summary.period.title());
    out.push('\n');
    out.push_str(&table.to_string());
    out.push('\n');
    let _ = writeln!(out, "Summary:");
    let _ = writeln!(out, "  Effective work:  {}", format_hms(summary.total_work));
    let _ = writeln!(out, "  Total break:     {}", format_hms(summary.total_break));
    out
}

/// Workdays of every user, as seen by an administrator.
pub fn render_all_workdays<Tz: TimeZone>(workdays: &[Workday], tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut table = new_table(&[
        "User (DNI)",
        "Date",
        "Start",
        "End",
        "Effective work",
        "Total break",
    ]);
    for workday in workdays {
        let day = DaySummary::from(workday);
        let mut row = vec![day.user_dni.clone().unwrap_or_default()];
        row.extend(day_row(&day, tz));
        push_row(&mut table, row);
    }
    format!("All recorded workdays\n\n{table}")
}

pub fn render_users(users: &[User]) -> String {
    let mut table = new_table(&["DNI", "Role"]);
    for user in users {
        push_row(&mut table, [user.dni.clone(), user.role.to_string()]);
    }
    table.to_string()
}

fn day_row<Tz: TimeZone>(day: &DaySummary, tz: &Tz) -> [String; 5]
where
    Tz::Offset: std::fmt::Display,
{
    [
        day.date.format("%Y-%m-%d").to_string(),
        format_clock(day.start, tz, NOT_AVAILABLE),
        format_clock(day.end, tz, NOT_AVAILABLE),
        format_hms(day.work),
        format_hms(day.breaks),
    ]
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use crate::tracker::{
        entities::{Role, User, Workday},
        summary::{Period, PeriodSummary},
        Tracker,
    };

    use super::{render_all_workdays, render_day, render_period, render_status, render_users};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
    }

    fn finished_day() -> Workday {
        let start = Utc.with_ymd_and_hms(2025, 3, 12, 8, 0, 0).unwrap();
        let mut tracker = Tracker::new(date());
        tracker.start(start).unwrap();
        tracker.start_break(start + Duration::hours(4)).unwrap();
        tracker
            .end_break(start + Duration::hours(4) + Duration::minutes(45))
            .unwrap();
        tracker.end(start + Duration::hours(9)).unwrap();
        tracker.into_workday()
    }

    #[test]
    fn status_lists_available_actions() {
        let start = Utc.with_ymd_and_hms(2025, 3, 12, 8, 0, 0).unwrap();
        let mut tracker = Tracker::new(date());
        let idle = render_status(&tracker, start, &Utc);
        assert!(idle.starts_with("Ready to start the day."));
        assert!(idle.contains("Start:           --:--:--"));
        assert!(idle.contains("Available:       start\n"));

        tracker.start(start).unwrap();
        let working = render_status(&tracker, start + Duration::minutes(90), &Utc);
        assert!(working.contains("Effective work:  01:30:00"));
        assert!(working.contains("Available:       break, end, reset\n"));
        assert!(working.contains("Workday started"));
    }

    #[test]
    fn status_counts_running_break() {
        let start = Utc.with_ymd_and_hms(2025, 3, 12, 8, 0, 0).unwrap();
        let mut tracker = Tracker::new(date());
        tracker.start(start).unwrap();
        tracker.start_break(start + Duration::hours(2)).unwrap();

        let out = render_status(&tracker, start + Duration::hours(2) + Duration::minutes(20), &Utc);
        assert!(out.contains("Total break:     00:20:00"));
    }

    #[test]
    fn tables_have_titles_and_separator() {
        let out = render_users(&[User {
            dni: "12345678A".into(),
            role: Role::Admin,
        }]);
        let lines = out.lines().collect::<Vec<_>>();
        assert!(lines[0].starts_with("DNI"));
        assert!(lines[1].trim().starts_with("---"));
        assert!(lines[2].starts_with("12345678A"));
        assert!(lines[2].contains("admin"));
    }

    #[test]
    fn day_view_contains_events_and_summary() {
        let workday = finished_day();
        let out = render_day(date(), Some(&workday), &Utc);
        assert!(out.contains("Break ended"));
        assert!(out.contains("00:45:00"));
        assert!(out.contains("Effective work:  08:15:00"));
        assert!(out.contains("Work end:        17:00:00"));

        assert_eq!(render_day(date(), None, &Utc), "No records for this date.\n");
    }

    #[test]
    fn period_view_totals() {
        let workdays = vec![finished_day()];
        let summary = PeriodSummary::build(Period::Week(date()), &workdays);
        let out = render_period(&summary, &Utc);
        assert!(out.starts_with("Weekly records (2025-03-09 to 2025-03-15)"));
        assert!(out.contains("Effective work:  08:15:00"));
        assert!(out.contains("Total break:     00:45:00"));

        let empty = PeriodSummary::build(Period::Month(date()), &Vec::new());
        assert_eq!(render_period(&empty, &Utc), "No records for this month.\n");
    }

    #[test]
    fn admin_view_shows_owner() {
        let mut workday = finished_day();
        workday.user_dni = Some("12345678A".into());
        let out = render_all_workdays(&[workday], &Utc);
        assert!(out.contains("12345678A"));
        assert!(out.contains("2025-03-12"));
    }
}
