use std::fmt::Display;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use now::DateTimeNow;

use crate::utils::time::week_start;

use super::entities::Workday;

/// Range of days a records view covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day(NaiveDate),
    /// Sunday to saturday week containing the date.
    Week(NaiveDate),
    /// Calendar month containing the date.
    Month(NaiveDate),
}

impl Period {
    pub fn first_day(&self) -> NaiveDate {
        match *self {
            Period::Day(date) => date,
            Period::Week(date) => week_start(date),
            Period::Month(date) => month_anchor(date).beginning_of_month().date_naive(),
        }
    }

    pub fn last_day(&self) -> NaiveDate {
        match *self {
            Period::Day(date) => date,
            Period::Week(date) => week_start(date) + Duration::days(6),
            Period::Month(date) => month_anchor(date).end_of_month().date_naive(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_day() <= date && date <= self.last_day()
    }

    pub fn title(&self) -> String {
        match *self {
            Period::Day(date) => format!("Records for {}", date.format("%Y-%m-%d")),
            Period::Week(_) => format!(
                "Weekly records ({} to {})",
                self.first_day().format("%Y-%m-%d"),
                self.last_day().format("%Y-%m-%d")
            ),
            Period::Month(date) => format!("Monthly records ({})", date.format("%B %Y")),
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Day(_) => write!(f, "day"),
            Period::Week(_) => write!(f, "week"),
            Period::Month(_) => write!(f, "month"),
        }
    }
}

fn month_anchor(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.with_day(1).unwrap_or(date).and_time(NaiveTime::MIN))
}

/// One row of a records table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySummary {
    pub user_dni: Option<String>,
    pub date: NaiveDate,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub work: Duration,
    pub breaks: Duration,
}

impl From<&Workday> for DaySummary {
    fn from(workday: &Workday) -> Self {
        Self {
            user_dni: workday.user_dni.clone(),
            date: workday.date,
            start: workday.start_time,
            end: workday.end_time,
            work: workday.recorded_work(),
            breaks: workday.total_break_duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSummary {
    pub period: Period,
    pub days: Vec<DaySummary>,
    pub total_work: Duration,
    pub total_break: Duration,
}

impl PeriodSummary {
    /// Keeps workdays inside `period` in the order the server returned them.
    pub fn build<'a>(period: Period, workdays: impl IntoIterator<Item = &'a Workday>) -> Self {
        let days = workdays
            .into_iter()
            .filter(|v| period.contains(v.date))
            .map(DaySummary::from)
            .collect::<Vec<_>>();
        let total_work = days.iter().fold(Duration::zero(), |acc, v| acc + v.work);
        let total_break = days.iter().fold(Duration::zero(), |acc, v| acc + v.breaks);
        Self {
            period,
            days,
            total_work,
            total_break,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
