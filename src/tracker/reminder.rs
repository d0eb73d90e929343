use std::fmt::Display;

use chrono::{DateTime, Duration, Utc};

use super::{Tracker, WorkdayStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reminder {
    /// Worked without interruption for the configured time.
    TakeBreak(Duration),
    /// Break lasted the configured time.
    BreakOver(Duration),
}

impl Display for Reminder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reminder::TakeBreak(v) => write!(
                f,
                "You have been working for {} minutes. Time for a break!",
                v.num_minutes()
            ),
            Reminder::BreakOver(v) => write!(
                f,
                "Your break has lasted {} minutes. Time to get back to work!",
                v.num_minutes()
            ),
        }
    }
}

/// Fires each reminder at most once per stretch of work or break. A new stretch (detected by a
/// different start moment) arms the reminder again.
#[derive(Debug, Default)]
pub struct ReminderSchedule {
    break_after: Option<Duration>,
    break_limit: Option<Duration>,
    fired_work_segment: Option<DateTime<Utc>>,
    fired_break_segment: Option<DateTime<Utc>>,
}

impl ReminderSchedule {
    pub fn new(break_after: Option<Duration>, break_limit: Option<Duration>) -> Self {
        Self {
            break_after: break_after.filter(|v| *v > Duration::zero()),
            break_limit: break_limit.filter(|v| *v > Duration::zero()),
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.break_after.is_some() || self.break_limit.is_some()
    }

    /// Returns the reminder that became due at `now`, if any.
    pub fn poll(&mut self, tracker: &Tracker, now: DateTime<Utc>) -> Option<Reminder> {
        match tracker.status() {
            WorkdayStatus::Working => {
                let threshold = self.break_after?;
                let since = tracker.working_since()?;
                Self::due(&mut self.fired_work_segment, since, threshold, now)
                    .then_some(Reminder::TakeBreak(threshold))
            }
            WorkdayStatus::OnBreak => {
                let threshold = self.break_limit?;
                let since = tracker.break_started()?;
                Self::due(&mut self.fired_break_segment, since, threshold, now)
                    .then_some(Reminder::BreakOver(threshold))
            }
            WorkdayStatus::Idle | WorkdayStatus::Finished => None,
        }
    }

    fn due(
        fired: &mut Option<DateTime<Utc>>,
        since: DateTime<Utc>,
        threshold: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        if *fired == Some(since) || now - since < threshold {
            return false;
        }
        *fired = Some(since);
        true
    }
}
