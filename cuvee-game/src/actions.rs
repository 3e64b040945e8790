//! Cellar actions a learner can trigger, and the stage each is legal in.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::ActionTimings;
use crate::stage::Stage;

/// Actions that complete after a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimedAction {
    Wash,
    Crush,
    Press,
    Filter,
}

impl TimedAction {
    pub const ALL: [Self; 4] = [Self::Wash, Self::Crush, Self::Press, Self::Filter];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wash => "wash",
            Self::Crush => "crush",
            Self::Press => "press",
            Self::Filter => "filter",
        }
    }

    #[must_use]
    pub const fn stage(self) -> Stage {
        match self {
            Self::Wash | Self::Crush => Stage::Preparation,
            Self::Press | Self::Filter => Stage::Filtration,
        }
    }

    /// The action whose completion this one depends on.
    #[must_use]
    pub const fn prerequisite(self) -> Option<Self> {
        match self {
            Self::Crush => Some(Self::Wash),
            Self::Filter => Some(Self::Press),
            Self::Wash | Self::Press => None,
        }
    }

    /// Delay until the next scheduled step of this action. Pressing advances
    /// in fixed steps; the others complete in one go.
    #[must_use]
    pub const fn step_delay(self, timings: &ActionTimings) -> Duration {
        Duration::from_millis(match self {
            Self::Wash => timings.wash_ms,
            Self::Crush => timings.crush_ms,
            Self::Press => timings.press_step_ms,
            Self::Filter => timings.filter_ms,
        })
    }
}

impl fmt::Display for TimedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions that take effect immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AddYeast,
    StartFermentation,
    StopFermentation,
    FillTirage,
    RiddleTurn,
    FreezeNeck,
    Disgorge,
    RunBottlingLine,
    ToggleHermetic,
}

impl Action {
    pub const ALL: [Self; 9] = [
        Self::AddYeast,
        Self::StartFermentation,
        Self::StopFermentation,
        Self::FillTirage,
        Self::RiddleTurn,
        Self::FreezeNeck,
        Self::Disgorge,
        Self::RunBottlingLine,
        Self::ToggleHermetic,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddYeast => "add_yeast",
            Self::StartFermentation => "start_fermentation",
            Self::StopFermentation => "stop_fermentation",
            Self::FillTirage => "fill_tirage",
            Self::RiddleTurn => "riddle_turn",
            Self::FreezeNeck => "freeze_neck",
            Self::Disgorge => "disgorge",
            Self::RunBottlingLine => "run_bottling_line",
            Self::ToggleHermetic => "toggle_hermetic",
        }
    }

    #[must_use]
    pub const fn stage(self) -> Stage {
        match self {
            Self::AddYeast => Stage::Preparation,
            Self::StartFermentation | Self::StopFermentation => Stage::Fermentation,
            Self::FillTirage => Stage::Tirage,
            Self::RiddleTurn => Stage::Riddling,
            Self::FreezeNeck => Stage::Freezing,
            Self::Disgorge => Stage::Disgorgement,
            Self::RunBottlingLine | Self::ToggleHermetic => Stage::Bottling,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle returned when a timed action begins.
///
/// The ticket is only honoured while both the session generation and the
/// action serial still match; anything older is a stale callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionTicket {
    pub action: TimedAction,
    pub generation: u64,
    pub serial: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prerequisites_stay_within_stage() {
        for action in TimedAction::ALL {
            if let Some(pre) = action.prerequisite() {
                assert_eq!(pre.stage(), action.stage());
            }
        }
    }

    #[test]
    fn delays_follow_timings() {
        let timings = ActionTimings::default();
        assert_eq!(
            TimedAction::Wash.step_delay(&timings),
            Duration::from_millis(2_000)
        );
        assert_eq!(
            TimedAction::Crush.step_delay(&timings),
            Duration::from_millis(2_500)
        );
        assert_eq!(
            TimedAction::Filter.step_delay(&timings),
            Duration::from_millis(3_000)
        );
        assert_eq!(
            TimedAction::Press.step_delay(&timings),
            Duration::from_millis(40)
        );
    }

    #[test]
    fn every_instant_action_has_a_working_stage() {
        for action in Action::ALL {
            assert!(action.stage().is_working(), "{action}");
        }
    }
}
