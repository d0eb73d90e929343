use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// This is the standard way of converting a date to a string in workclock. The server keys
/// workdays by this value.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Formats a duration as `HH:MM:SS`. Hours are not capped, so long periods read as `123:04:05`.
/// Negative durations are shown as zero.
pub fn format_hms(duration: Duration) -> String {
    if duration < Duration::zero() {
        return "00:00:00".into();
    }
    let total_seconds = duration.num_seconds();
    format!(
        "{:02}:{:02}:{:02}",
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60
    )
}

/// Time of day in `tz`, or a placeholder when the moment is absent.
pub fn format_clock<Tz: TimeZone>(moment: Option<DateTime<Utc>>, tz: &Tz, missing: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    moment
        .map(|v| v.with_timezone(tz).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| missing.to_string())
}

/// Full date and time in `tz`, used where the day matters as well, e.g. exports.
pub fn format_date_time<Tz: TimeZone>(moment: Option<DateTime<Utc>>, tz: &Tz, missing: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    moment
        .map(|v| v.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| missing.to_string())
}

/// Returns sunday of the week containing `date`. Weeks run from sunday to saturday.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Difference between two moments, never below zero.
pub fn clamped_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).max(Duration::zero())
}
