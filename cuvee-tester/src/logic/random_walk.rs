//! Seeded command generator for invariant sweeps.
use cuvee_game::{Action, Command, Parameter, ProcessPath, ProcessState, Stage, TimedAction};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;

/// Chance, out of 1000, that a step restarts the session.
const RESTART_PER_MILLE: u32 = 8;

pub struct RandomWalker {
    rng: ChaCha20Rng,
}

impl RandomWalker {
    #[must_use]
    pub const fn new(rng: ChaCha20Rng) -> Self {
        Self { rng }
    }

    /// Pick the next command. Mostly legal-looking input for the current
    /// stage, with a steady share of arbitrary commands mixed in.
    pub fn next_command(&mut self, state: &ProcessState) -> Command {
        if self.rng.gen_range(0..1000) < RESTART_PER_MILLE {
            return Command::Restart;
        }
        if state.path.is_none() && self.rng.gen_bool(0.8) {
            let path = *ProcessPath::ALL.choose(&mut self.rng).unwrap_or(&ProcessPath::Still);
            return Command::SelectPath { path };
        }
        match self.rng.gen_range(0..10) {
            0..=2 => Command::Advance,
            3 | 4 => self.stage_action(state.current_stage),
            5 => Command::SetParameter {
                parameter: self.parameter(),
            },
            6 => Command::Wait {
                ms: self.rng.gen_range(0..=4_000),
            },
            7 => Command::NavigateTo {
                stage: *Stage::ALL.choose(&mut self.rng).unwrap_or(&Stage::Preparation),
            },
            8 => Command::Begin {
                action: *TimedAction::ALL
                    .choose(&mut self.rng)
                    .unwrap_or(&TimedAction::Wash),
            },
            _ => Command::Perform {
                action: *Action::ALL.choose(&mut self.rng).unwrap_or(&Action::AddYeast),
            },
        }
    }

    fn stage_action(&mut self, stage: Stage) -> Command {
        let timed: Vec<TimedAction> = TimedAction::ALL
            .into_iter()
            .filter(|action| action.stage() == stage)
            .collect();
        let instant: Vec<Action> = Action::ALL
            .into_iter()
            .filter(|action| action.stage() == stage)
            .collect();
        let pick_timed = !timed.is_empty() && (instant.is_empty() || self.rng.gen_bool(0.5));
        if pick_timed && let Some(action) = timed.choose(&mut self.rng) {
            return Command::Begin { action: *action };
        }
        instant
            .choose(&mut self.rng)
            .map_or(Command::TickFermentation, |action| Command::Perform {
                action: *action,
            })
    }

    fn parameter(&mut self) -> Parameter {
        match self.rng.gen_range(0..5) {
            0 => Parameter::CrushGranularity(self.rng.gen_range(-20..=140)),
            1 => Parameter::FermentationTemp(self.rng.gen_range(-10.0..=60.0)),
            2 => Parameter::AgingWeeks(self.rng.gen_range(-1..=7)),
            3 => Parameter::RiddlingProgress(self.rng.gen_range(-30..=130)),
            _ => Parameter::Hermetic(self.rng.gen_bool(0.7)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn same_seed_same_commands() {
        let state = ProcessState::default();
        let mut a = RandomWalker::new(ChaCha20Rng::seed_from_u64(7));
        let mut b = RandomWalker::new(ChaCha20Rng::seed_from_u64(7));
        for _ in 0..50 {
            assert_eq!(a.next_command(&state), b.next_command(&state));
        }
    }

    #[test]
    fn stage_actions_match_the_stage() {
        let mut walker = RandomWalker::new(ChaCha20Rng::seed_from_u64(3));
        for _ in 0..40 {
            match walker.stage_action(Stage::Riddling) {
                Command::Perform { action } => assert_eq!(action, Action::RiddleTurn),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(walker.stage_action(Stage::Results), Command::TickFermentation);
    }
}
