use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::{
    api::WorkdayApi,
    tracker::{Action, Tracker, TransitionError},
    utils::clock::Clock,
};

/// Loads the record of `date`. Days without a record start idle.
pub async fn load_day(api: &dyn WorkdayApi, dni: &str, date: NaiveDate) -> Result<Tracker> {
    Ok(match api.get_workday(dni, date).await? {
        Some(workday) => Tracker::from_workday(workday),
        None => Tracker::new(date),
    })
}

/// Applies a clock action to today's record and stores the result. Nothing is sent when the
/// action isn't allowed in the current state.
#[instrument(skip(api, clock))]
pub async fn apply_action(
    api: &dyn WorkdayApi,
    dni: &str,
    clock: &dyn Clock,
    action: Action,
) -> Result<Tracker> {
    let mut tracker = load_day(api, dni, clock.today()).await?;
    let now = clock.time();

    match action {
        Action::Start => tracker.start(now)?,
        Action::StartBreak => tracker.start_break(now)?,
        Action::EndBreak => {
            tracker.end_break(now)?;
        }
        Action::End => tracker.end(now)?,
        Action::Reset => {
            // Validate before deleting anything on the server
            if !tracker.can_reset() {
                return Err(TransitionError::InvalidTransition {
                    action,
                    status: tracker.status(),
                }
                .into());
            }
            api.delete_workday(dni, tracker.workday().date).await?;
            tracker.reset(now)?;
        }
    }

    api.save_workday(dni, tracker.workday()).await?;
    info!("Stored workday {} as {}", tracker.workday().date, tracker.status());
    Ok(tracker)
}
