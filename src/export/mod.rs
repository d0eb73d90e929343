use std::fmt::Write;

use chrono::TimeZone;
use thiserror::Error;

use crate::{
    tracker::entities::{LogEvent, Workday},
    utils::time::{format_clock, format_date_time, format_hms},
};

pub const CSV_HEADER: &str =
    "Date,Work start,Work end,Effective work (HH:MM:SS),Total break (HH:MM:SS),Events";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("There is no data to export")]
    NoData,
}

pub fn default_file_name(dni: &str) -> String {
    format!("workdays_{dni}.csv")
}

/// Renders workdays as CSV, one line per day in the given order. Every field but the date is
/// quoted.
pub fn workdays_to_csv<Tz: TimeZone>(workdays: &[Workday], tz: &Tz) -> Result<String, ExportError>
where
    Tz::Offset: std::fmt::Display,
{
    if workdays.is_empty() {
        return Err(ExportError::NoData);
    }

    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');

    for workday in workdays {
        let events = workday
            .events
            .iter()
            .map(|e| format_event(e, tz))
            .collect::<Vec<_>>()
            .join("; ");
        // Writing into a String never fails
        let _ = writeln!(
            out,
            "{},{},{},{},{},{}",
            workday.date.format("%Y-%m-%d"),
            quote(&format_date_time(workday.start_time, tz, "N/A")),
            quote(&format_date_time(workday.end_time, tz, "N/A")),
            quote(&format_hms(workday.recorded_work())),
            quote(&format_hms(workday.total_break_duration)),
            quote(&events),
        );
    }

    Ok(out)
}

fn format_event<Tz: TimeZone>(event: &LogEvent, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let duration = match event.duration {
        Some(v) if !v.is_zero() => format!(" ({})", format_hms(v)),
        _ => String::new(),
    };
    format!(
        "{}{duration} @ {}",
        event.event.label(),
        format_clock(Some(event.time), tz, "")
    )
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
