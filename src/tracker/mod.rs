//! Workday clock. [Tracker] owns the record of the current day and moves it through
//! `idle -> working <-> on_break`, `working -> finished`. Every successful transition appends an
//! entry to the workday log; the caller is responsible for sending the result to the server.

pub mod entities;
pub mod reminder;
pub mod summary;

use std::fmt::Display;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use entities::{EventKind, LogEvent, Workday};
use thiserror::Error;
use tracing::debug;

use crate::utils::time::clamped_between;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkdayStatus {
    Idle,
    Working,
    OnBreak,
    Finished,
}

impl Display for WorkdayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkdayStatus::Idle => write!(f, "idle"),
            WorkdayStatus::Working => write!(f, "working"),
            WorkdayStatus::OnBreak => write!(f, "on_break"),
            WorkdayStatus::Finished => write!(f, "finished"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    StartBreak,
    EndBreak,
    End,
    Reset,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Start => write!(f, "start the workday"),
            Action::StartBreak => write!(f, "start a break"),
            Action::EndBreak => write!(f, "end the break"),
            Action::End => write!(f, "end the workday"),
            Action::Reset => write!(f, "reset the workday"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Can't {action} while {status}")]
    InvalidTransition {
        action: Action,
        status: WorkdayStatus,
    },
}

/// Which actions the current status allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailableActions {
    pub start: bool,
    pub start_break: bool,
    pub end_break: bool,
    pub end: bool,
    pub reset: bool,
}

impl AvailableActions {
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Start => self.start,
            Action::StartBreak => self.start_break,
            Action::EndBreak => self.end_break,
            Action::End => self.end,
            Action::Reset => self.reset,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tracker {
    workday: Workday,
    status: WorkdayStatus,
    break_started: Option<DateTime<Utc>>,
}

impl Tracker {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            workday: Workday::new(date),
            status: WorkdayStatus::Idle,
            break_started: None,
        }
    }

    /// Rebuilds the clock from a stored record. A finished day wins over everything, then an
    /// unmatched break start, then a started day.
    pub fn from_workday(workday: Workday) -> Self {
        let mut break_started = None;
        let status = if workday.end_time.is_some() {
            WorkdayStatus::Finished
        } else if let Some(started) = open_break(&workday.events) {
            break_started = Some(started);
            WorkdayStatus::OnBreak
        } else if workday.start_time.is_some() {
            WorkdayStatus::Working
        } else {
            WorkdayStatus::Idle
        };
        debug!("Restored workday {} as {status}", workday.date);
        Self {
            workday,
            status,
            break_started,
        }
    }

    pub fn workday(&self) -> &Workday {
        &self.workday
    }

    pub fn into_workday(self) -> Workday {
        self.workday
    }

    pub fn status(&self) -> WorkdayStatus {
        self.status
    }

    pub fn break_started(&self) -> Option<DateTime<Utc>> {
        self.break_started
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.ensure(Action::Start)?;
        self.workday.start_time = Some(now);
        self.log(EventKind::WorkStarted, now);
        self.status = WorkdayStatus::Working;
        Ok(())
    }

    pub fn start_break(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.ensure(Action::StartBreak)?;
        self.break_started = Some(now);
        self.log(EventKind::BreakStarted, now);
        self.status = WorkdayStatus::OnBreak;
        Ok(())
    }

    /// Returns the length of the finished break.
    pub fn end_break(&mut self, now: DateTime<Utc>) -> Result<Duration, TransitionError> {
        self.ensure(Action::EndBreak)?;
        let started = self.break_started.take().unwrap_or(now);
        let length = clamped_between(started, now);
        self.workday.total_break_duration += length;
        self.workday
            .events
            .push(LogEvent::new(EventKind::BreakEnded, now).with_duration(length));
        self.status = WorkdayStatus::Working;
        Ok(length)
    }

    pub fn end(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.ensure(Action::End)?;
        self.workday.end_time = Some(now);
        self.log(EventKind::WorkEnded, now);
        self.status = WorkdayStatus::Finished;
        Ok(())
    }

    /// Whether [Tracker::reset] would be accepted.
    pub fn can_reset(&self) -> bool {
        self.status != WorkdayStatus::Idle || self.workday.start_time.is_some()
    }

    /// Starts the day over. The stored record has to be deleted before the returned state is
    /// saved, otherwise the server keeps the old log.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if !self.can_reset() {
            return Err(TransitionError::InvalidTransition {
                action: Action::Reset,
                status: self.status,
            });
        }
        let mut workday = Workday::new(self.workday.date);
        workday.user_dni = self.workday.user_dni.take();
        workday.events.push(LogEvent::new(EventKind::WorkdayReset, now));
        self.workday = workday;
        self.status = WorkdayStatus::Idle;
        self.break_started = None;
        Ok(())
    }

    /// Worked time so far. Running days are measured up to `now`.
    pub fn effective_work(&self, now: DateTime<Utc>) -> Duration {
        let Some(start) = self.workday.start_time else {
            return Duration::zero();
        };
        let until = self.workday.end_time.unwrap_or(now);
        (until - start - self.workday.total_break_duration).max(Duration::zero())
    }

    pub fn total_break(&self) -> Duration {
        self.workday.total_break_duration
    }

    /// Break time including a break that is still running.
    pub fn total_break_at(&self, now: DateTime<Utc>) -> Duration {
        self.workday.total_break_duration
            + self
                .break_started
                .map(|started| clamped_between(started, now))
                .unwrap_or_else(Duration::zero)
    }

    pub fn available_actions(&self) -> AvailableActions {
        match self.status {
            WorkdayStatus::Idle => AvailableActions {
                start: true,
                start_break: false,
                end_break: false,
                end: false,
                reset: false,
            },
            WorkdayStatus::Working => AvailableActions {
                start: false,
                start_break: true,
                end_break: false,
                end: true,
                reset: true,
            },
            WorkdayStatus::OnBreak => AvailableActions {
                start: false,
                start_break: false,
                end_break: true,
                end: false,
                reset: true,
            },
            WorkdayStatus::Finished => AvailableActions {
                start: false,
                start_break: false,
                end_break: false,
                end: false,
                reset: true,
            },
        }
    }

    pub fn status_message(&self) -> &'static str {
        match self.status {
            WorkdayStatus::Idle => "Ready to start the day.",
            WorkdayStatus::Working => "Workday in progress!",
            WorkdayStatus::OnBreak => "You are on a break.",
            WorkdayStatus::Finished => "Workday finished. Good job!",
        }
    }

    /// Moment the current uninterrupted stretch of work began. Used by reminders.
    pub fn working_since(&self) -> Option<DateTime<Utc>> {
        if self.status != WorkdayStatus::Working {
            return None;
        }
        self.workday
            .events
            .iter()
            .rev()
            .find(|e| e.event.ends_break() || e.event == EventKind::WorkStarted)
            .map(|e| e.time)
            .or(self.workday.start_time)
    }

    fn ensure(&self, action: Action) -> Result<(), TransitionError> {
        if self.available_actions().allows(action) {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition {
                action,
                status: self.status,
            })
        }
    }

    fn log(&mut self, event: EventKind, now: DateTime<Utc>) {
        self.workday.events.push(LogEvent::new(event, now));
    }
}

/// Returns the start of the last break if any break start has no later break end.
fn open_break(events: &[LogEvent]) -> Option<DateTime<Utc>> {
    let unmatched = events.iter().any(|start| {
        start.event == EventKind::BreakStarted
            && !events
                .iter()
                .any(|end| end.event.ends_break() && end.time > start.time)
    });
    if !unmatched {
        return None;
    }
    events
        .iter()
        .rev()
        .find(|e| e.event == EventKind::BreakStarted)
        .map(|e| e.time)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use super::{
        entities::{EventKind, LogEvent, Workday},
        Action, Tracker, TransitionError, WorkdayStatus,
    };

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
    const TEST_START: NaiveDateTime =
        NaiveDateTime::new(TEST_DATE, NaiveTime::from_hms_opt(8, 0, 0).unwrap());

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START) + Duration::minutes(minutes)
    }

    #[test]
    fn full_day_flow() {
        let mut tracker = Tracker::new(TEST_DATE);
        assert_eq!(tracker.status(), WorkdayStatus::Idle);

        tracker.start(at(0)).unwrap();
        assert_eq!(tracker.status(), WorkdayStatus::Working);

        tracker.start_break(at(120)).unwrap();
        assert_eq!(tracker.status(), WorkdayStatus::OnBreak);

        let length = tracker.end_break(at(150)).unwrap();
        assert_eq!(length, Duration::minutes(30));
        assert_eq!(tracker.status(), WorkdayStatus::Working);

        tracker.end(at(510)).unwrap();
        assert_eq!(tracker.status(), WorkdayStatus::Finished);

        let workday = tracker.workday();
        assert_eq!(workday.start_time, Some(at(0)));
        assert_eq!(workday.end_time, Some(at(510)));
        assert_eq!(workday.total_break_duration, Duration::minutes(30));
        let kinds = workday.events.iter().map(|e| e.event.clone()).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                EventKind::WorkStarted,
                EventKind::BreakStarted,
                EventKind::BreakEnded,
                EventKind::WorkEnded
            ]
        );
        assert_eq!(workday.events[2].duration, Some(Duration::minutes(30)));
        assert_eq!(tracker.effective_work(at(1000)), Duration::minutes(480));
    }

    #[test]
    fn actions_per_status() {
        let mut tracker = Tracker::new(TEST_DATE);
        let idle = tracker.available_actions();
        assert!(idle.start && !idle.start_break && !idle.end_break && !idle.end && !idle.reset);

        tracker.start(at(0)).unwrap();
        let working = tracker.available_actions();
        assert!(!working.start && working.start_break && !working.end_break);
        assert!(working.end && working.reset);

        tracker.start_break(at(1)).unwrap();
        let on_break = tracker.available_actions();
        assert!(!on_break.start && !on_break.start_break && on_break.end_break);
        assert!(!on_break.end && on_break.reset);

        tracker.end_break(at(2)).unwrap();
        tracker.end(at(3)).unwrap();
        let finished = tracker.available_actions();
        assert!(!finished.start && !finished.start_break && !finished.end_break && !finished.end);
        assert!(finished.reset);
    }

    #[test]
    fn rejected_transitions_leave_workday_untouched() {
        let mut tracker = Tracker::new(TEST_DATE);
        assert_eq!(
            tracker.end(at(0)),
            Err(TransitionError::InvalidTransition {
                action: Action::End,
                status: WorkdayStatus::Idle
            })
        );
        tracker.start(at(0)).unwrap();
        tracker.start_break(at(10)).unwrap();
        let before = tracker.workday().clone();

        assert!(tracker.end(at(20)).is_err());
        assert!(tracker.start(at(20)).is_err());
        assert!(tracker.start_break(at(20)).is_err());
        assert_eq!(tracker.workday(), &before);
        assert_eq!(tracker.status(), WorkdayStatus::OnBreak);
    }

    #[test]
    fn effective_work_counts_running_day_and_clamps() {
        let mut tracker = Tracker::new(TEST_DATE);
        assert_eq!(tracker.effective_work(at(30)), Duration::zero());

        tracker.start(at(0)).unwrap();
        assert_eq!(tracker.effective_work(at(45)), Duration::minutes(45));
        // Clock skew between devices may put now before the start
        assert_eq!(tracker.effective_work(at(-5)), Duration::zero());
    }

    #[test]
    fn break_with_clock_going_backwards_adds_nothing() {
        let mut tracker = Tracker::new(TEST_DATE);
        tracker.start(at(0)).unwrap();
        tracker.start_break(at(60)).unwrap();
        assert_eq!(tracker.end_break(at(50)).unwrap(), Duration::zero());
        assert_eq!(tracker.total_break(), Duration::zero());
    }

    #[test]
    fn total_break_includes_running_break() {
        let mut tracker = Tracker::new(TEST_DATE);
        tracker.start(at(0)).unwrap();
        tracker.start_break(at(60)).unwrap();
        tracker.end_break(at(70)).unwrap();
        tracker.start_break(at(100)).unwrap();
        assert_eq!(tracker.total_break(), Duration::minutes(10));
        assert_eq!(tracker.total_break_at(at(105)), Duration::minutes(15));
    }

    #[test]
    fn restores_status_from_stored_record() {
        let mut workday = Workday::new(TEST_DATE);
        assert_eq!(Tracker::from_workday(workday.clone()).status(), WorkdayStatus::Idle);

        workday.start_time = Some(at(0));
        workday.events.push(LogEvent::new(EventKind::WorkStarted, at(0)));
        assert_eq!(Tracker::from_workday(workday.clone()).status(), WorkdayStatus::Working);

        workday.events.push(LogEvent::new(EventKind::BreakStarted, at(30)));
        let on_break = Tracker::from_workday(workday.clone());
        assert_eq!(on_break.status(), WorkdayStatus::OnBreak);
        assert_eq!(on_break.break_started(), Some(at(30)));

        workday.events.push(
            LogEvent::new(EventKind::Other("Pausa Finalizada (00:10:00)".into()), at(40))
                .with_duration(Duration::minutes(10)),
        );
        assert_eq!(Tracker::from_workday(workday.clone()).status(), WorkdayStatus::Working);

        workday.events.push(LogEvent::new(EventKind::BreakStarted, at(90)));
        workday.end_time = Some(at(100));
        assert_eq!(Tracker::from_workday(workday).status(), WorkdayStatus::Finished);
    }

    #[test]
    fn restored_break_can_be_ended() {
        let mut workday = Workday::new(TEST_DATE);
        workday.start_time = Some(at(0));
        workday.events.push(LogEvent::new(EventKind::WorkStarted, at(0)));
        workday.events.push(LogEvent::new(EventKind::BreakStarted, at(30)));

        let mut tracker = Tracker::from_workday(workday);
        assert_eq!(tracker.end_break(at(45)).unwrap(), Duration::minutes(15));
        assert_eq!(tracker.total_break(), Duration::minutes(15));
    }

    #[test]
    fn reset_starts_over_with_single_event() {
        let mut tracker = Tracker::new(TEST_DATE);
        assert_eq!(
            tracker.reset(at(0)),
            Err(TransitionError::InvalidTransition {
                action: Action::Reset,
                status: WorkdayStatus::Idle
            })
        );

        tracker.start(at(0)).unwrap();
        tracker.start_break(at(10)).unwrap();
        tracker.reset(at(20)).unwrap();

        assert_eq!(tracker.status(), WorkdayStatus::Idle);
        assert_eq!(tracker.break_started(), None);
        let workday = tracker.workday();
        assert_eq!(workday.date, TEST_DATE);
        assert_eq!(workday.start_time, None);
        assert_eq!(workday.total_break_duration, Duration::zero());
        assert_eq!(workday.events, vec![LogEvent::new(EventKind::WorkdayReset, at(20))]);

        // The reset record restores as idle and can be started again
        let mut restored = Tracker::from_workday(workday.clone());
        assert_eq!(restored.status(), WorkdayStatus::Idle);
        restored.start(at(30)).unwrap();
    }

    #[test]
    fn working_since_follows_last_break() {
        let mut tracker = Tracker::new(TEST_DATE);
        assert_eq!(tracker.working_since(), None);
        tracker.start(at(0)).unwrap();
        assert_eq!(tracker.working_since(), Some(at(0)));
        tracker.start_break(at(60)).unwrap();
        assert_eq!(tracker.working_since(), None);
        tracker.end_break(at(75)).unwrap();
        assert_eq!(tracker.working_since(), Some(at(75)));
    }
}
