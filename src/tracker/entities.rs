use std::fmt::Display;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Attendance record for a single day, exchanged with the server as is. Times travel as
/// milliseconds since epoch.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Workday {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_dni: Option<String>,
    pub date: NaiveDate,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "Duration::zero", with = "duration_ms")]
    pub total_break_duration: Duration,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub events: Vec<LogEvent>,
}

impl Workday {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            user_dni: None,
            date,
            start_time: None,
            end_time: None,
            total_break_duration: Duration::zero(),
            events: vec![],
        }
    }

    /// Effective work of a stored day. Only complete days count.
    pub fn recorded_work(&self) -> Duration {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => {
                (end - start - self.total_break_duration).max(Duration::zero())
            }
            _ => Duration::zero(),
        }
    }
}

/// Entry of the workday log.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct LogEvent {
    pub event: EventKind,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time: DateTime<Utc>,
    #[serde(default, with = "duration_ms_option")]
    pub duration: Option<Duration>,
}

impl LogEvent {
    pub fn new(event: EventKind, time: DateTime<Utc>) -> Self {
        Self {
            event,
            time,
            duration: None,
        }
    }

    pub fn with_duration(self, duration: Duration) -> Self {
        Self {
            duration: Some(duration),
            ..self
        }
    }
}

/// Kinds of log entries. The wire names are the ones already stored on the server, so they stay
/// untranslated. Unknown names are kept verbatim.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    WorkStarted,
    BreakStarted,
    BreakEnded,
    WorkEnded,
    WorkdayReset,
    Other(String),
}

const WORK_STARTED: &str = "Jornada Iniciada";
const BREAK_STARTED: &str = "Pausa Iniciada";
const BREAK_ENDED: &str = "Pausa Finalizada";
const WORK_ENDED: &str = "Jornada Finalizada";
const WORKDAY_RESET: &str = "Jornada Reiniciada";

impl EventKind {
    pub fn wire_name(&self) -> &str {
        match self {
            EventKind::WorkStarted => WORK_STARTED,
            EventKind::BreakStarted => BREAK_STARTED,
            EventKind::BreakEnded => BREAK_ENDED,
            EventKind::WorkEnded => WORK_ENDED,
            EventKind::WorkdayReset => WORKDAY_RESET,
            EventKind::Other(name) => name,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            EventKind::WorkStarted => "Workday started",
            EventKind::BreakStarted => "Break started",
            EventKind::BreakEnded => "Break ended",
            EventKind::WorkEnded => "Workday ended",
            EventKind::WorkdayReset => "Workday reset",
            EventKind::Other(name) => name,
        }
    }

    /// Older clients appended details after the break end name.
    pub fn ends_break(&self) -> bool {
        match self {
            EventKind::BreakEnded => true,
            EventKind::Other(name) => name.starts_with(BREAK_ENDED),
            _ => false,
        }
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            WORK_STARTED => EventKind::WorkStarted,
            BREAK_STARTED => EventKind::BreakStarted,
            BREAK_ENDED => EventKind::BreakEnded,
            WORK_ENDED => EventKind::WorkEnded,
            WORKDAY_RESET => EventKind::WorkdayReset,
            _ => EventKind::Other(value),
        }
    }
}

impl From<EventKind> for String {
    fn from(value: EventKind) -> Self {
        match value {
            EventKind::Other(name) => name,
            v => v.wire_name().to_string(),
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub dni: String,
    pub role: Role,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    User,
    Admin,
    Other(String),
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Role::User,
            "admin" => Role::Admin,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.to_string()
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
            Role::Other(name) => write!(f, "{name}"),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<LogEvent>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<LogEvent>>::deserialize(deserializer)?.unwrap_or_default())
}

mod duration_ms {
    use chrono::Duration;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_milliseconds())
    }

    /// Null is read as zero.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.);
        Ok(Duration::milliseconds(ms as i64))
    }
}

mod duration_ms_option {
    use chrono::Duration;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(v) => serializer.serialize_some(&v.num_milliseconds()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = Option::<f64>::deserialize(deserializer)?;
        Ok(ms.map(|v| Duration::milliseconds(v as i64)))
    }
}
