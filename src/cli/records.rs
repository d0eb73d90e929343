use std::{fmt::Display, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, TimeZone};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Subcommand, ValueEnum};
use tracing::info;

use crate::{
    api::WorkdayApi,
    export::{default_file_name, workdays_to_csv},
    tracker::summary::{Period, PeriodSummary},
    utils::clock::Clock,
};

use super::{
    output::{render_day, render_period},
    Args,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct DateArgs {
    #[arg(
        long,
        short,
        help = "Day to look at. Examples are \"yesterday\", \"last friday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

#[derive(Debug, Subcommand)]
pub enum RecordsCommand {
    #[command(about = "Event log and summary of a single day")]
    Day {
        #[command(flatten)]
        date: DateArgs,
    },
    #[command(about = "Workdays of the week (sunday to saturday) containing the date")]
    Week {
        #[command(flatten)]
        date: DateArgs,
    },
    #[command(about = "Workdays of the month containing the date")]
    Month {
        #[command(flatten)]
        date: DateArgs,
    },
}

impl DateArgs {
    fn resolve(&self, clock: &dyn Clock) -> Result<NaiveDate> {
        let Some(date) = &self.date else {
            return Ok(clock.today());
        };
        let now = clock.time().with_timezone(&Local);
        match parse_date_string(date, now, self.date_style.into()) {
            Ok(v) => Ok(v.date_naive()),
            Err(e) => Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate date {date:?}: {e}"),
                )
                .into()),
        }
    }
}

/// Produces the text of a records view.
pub async fn records_report<Tz: TimeZone>(
    api: &dyn WorkdayApi,
    dni: &str,
    clock: &dyn Clock,
    command: &RecordsCommand,
    tz: &Tz,
) -> Result<String>
where
    Tz::Offset: std::fmt::Display,
{
    let period = match command {
        RecordsCommand::Day { date } => Period::Day(date.resolve(clock)?),
        RecordsCommand::Week { date } => Period::Week(date.resolve(clock)?),
        RecordsCommand::Month { date } => Period::Month(date.resolve(clock)?),
    };

    if let Period::Day(date) = period {
        let workday = api.get_workday(dni, date).await?;
        return Ok(render_day(date, workday.as_ref(), tz));
    }

    let workdays = api.user_workdays(dni).await?;
    let summary = PeriodSummary::build(period, &workdays);
    Ok(render_period(&summary, tz))
}

/// Writes every workday of the user to a CSV file and returns its path.
pub async fn export_workdays<Tz: TimeZone>(
    api: &dyn WorkdayApi,
    dni: &str,
    output: Option<PathBuf>,
    tz: &Tz,
) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let workdays = api.user_workdays(dni).await?;
    let csv = workdays_to_csv(&workdays, tz)?;
    let path = output.unwrap_or_else(|| PathBuf::from(default_file_name(dni)));
    tokio::fs::write(&path, csv)
        .await
        .with_context(|| format!("Can't write export to {path:?}"))?;
    info!("Exported {} workdays to {path:?}", workdays.len());
    Ok(path)
}
