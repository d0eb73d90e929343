use std::{io::Write, sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Local;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    api::WorkdayApi,
    tracker::{reminder::ReminderSchedule, Tracker},
    utils::{
        clock::{Clock, TICK},
        time::format_clock,
    },
};

use super::{output::render_status, workday::load_day};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const BELL: &str = "\x07";

/// Redraws today's status every second, rings reminders and picks up changes made from other
/// terminals by reloading the workday periodically.
pub struct LiveClock<W> {
    api: Arc<dyn WorkdayApi>,
    dni: String,
    clock: Box<dyn Clock>,
    reminders: ReminderSchedule,
    refresh_interval: Duration,
    shutdown: CancellationToken,
    out: W,
}

impl<W: Write + Send> LiveClock<W> {
    pub fn new(
        api: Arc<dyn WorkdayApi>,
        dni: String,
        clock: Box<dyn Clock>,
        reminders: ReminderSchedule,
        refresh_interval: Duration,
        shutdown: CancellationToken,
        out: W,
    ) -> Self {
        Self {
            api,
            dni,
            clock,
            reminders,
            refresh_interval,
            shutdown,
            out,
        }
    }

    fn draw(&mut self, tracker: &Tracker) -> Result<()> {
        let now = self.clock.time();
        write!(self.out, "{CLEAR_SCREEN}")?;
        writeln!(self.out, "Now:             {}", format_clock(Some(now), &Local, ""))?;
        write!(self.out, "{}", render_status(tracker, now, &Local))?;
        writeln!(self.out, "\nPress Ctrl+C to exit.")?;

        if let Some(reminder) = self.reminders.poll(tracker, now) {
            info!("Reminder: {reminder}");
            writeln!(self.out, "{BELL}{reminder}")?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Runs until the shutdown token is cancelled. Returns the writer so that output can be
    /// inspected.
    pub async fn run(mut self) -> Result<W> {
        let mut tracker = load_day(self.api.as_ref(), &self.dni, self.clock.today()).await?;
        let mut tick = self.clock.instant();
        let mut refresh = tick + self.refresh_interval;

        loop {
            if self.clock.instant() >= refresh {
                refresh += self.refresh_interval;
                // Keep showing the last known state while the server is unreachable
                match load_day(self.api.as_ref(), &self.dni, self.clock.today()).await {
                    Ok(v) => tracker = v,
                    Err(e) => error!("Failed to refresh workday {e:?}"),
                }
            }

            self.draw(&tracker)?;

            tick += TICK;
            let cancelled = select! {
                _ = self.shutdown.cancelled() => true,
                _ = self.clock.sleep_until(tick) => false,
            };
            if cancelled {
                return Ok(self.out);
            }
        }
    }
}

/// Cancels `cancelation` once the process receives Ctrl+C.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
    };
}
