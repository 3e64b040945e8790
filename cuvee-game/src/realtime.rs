//! Wall-clock driver for a [`ProcessSession`].
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::constants::LOG_TARGET;
use crate::session::ProcessSession;

/// Pump the session clock from a tokio interval for `wall` real time,
/// advancing virtual time by the wall time actually elapsed between ticks.
/// Returns the number of scheduled tasks that ran.
pub async fn drive_for(
    session: &mut ProcessSession,
    wall: Duration,
    resolution: Duration,
) -> usize {
    let resolution = resolution.max(Duration::from_millis(1));
    let start = Instant::now();
    let deadline = start + wall;
    let mut interval = time::interval(resolution);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last = start;
    let mut ran = 0;
    loop {
        let tick = interval.tick().await.min(deadline);
        ran += session.advance_clock(tick.saturating_duration_since(last));
        last = tick;
        if tick >= deadline {
            break;
        }
    }
    log::debug!(target: LOG_TARGET, "realtime driver ran {ran} tasks over {wall:?}");
    ran
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Action, TimedAction};
    use crate::stage::{ProcessPath, Stage};
    use crate::state::FermentationStatus;

    #[tokio::test(start_paused = true)]
    async fn wash_completes_against_the_wall_clock() {
        let mut session = ProcessSession::default();
        session.select_path(ProcessPath::Still).unwrap();
        session.begin_timed_action(TimedAction::Wash).unwrap();

        drive_for(&mut session, Duration::from_millis(1_500), Duration::from_millis(100)).await;
        assert!(session.state().is_washing);
        let ran = drive_for(
            &mut session,
            Duration::from_millis(600),
            Duration::from_millis(100),
        )
        .await;
        assert_eq!(ran, 1);
        assert!(session.state().is_washed);
        assert_eq!(session.now(), Duration::from_millis(2_100));
    }

    #[tokio::test(start_paused = true)]
    async fn fermentation_runs_to_done() {
        let mut session = ProcessSession::default();
        session.select_path(ProcessPath::Sparkling).unwrap();
        session.advance().unwrap();
        assert_eq!(session.current_stage(), Stage::Fermentation);
        session.perform(Action::StartFermentation).unwrap();

        drive_for(&mut session, Duration::from_secs(30), Duration::from_millis(250)).await;
        assert_eq!(session.state().fermentation_status, FermentationStatus::Done);
        assert_eq!(session.state().fermentation_ticks, 50);
    }
}
