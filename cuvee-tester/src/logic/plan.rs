use anyhow::{Context, Result};
use cuvee_game::realtime::drive_for;
use cuvee_game::{
    Command, PanelReadings, ProcessConfig, ProcessPath, ProcessSession, ProcessState,
    ResultSummary, Stage,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

use super::random_walk::RandomWalker;

/// Upper bound on virtual time a single settle step may consume.
const SETTLE_LIMIT: Duration = Duration::from_secs(600);
const WALL_CLOCK_RESOLUTION: Duration = Duration::from_millis(5);

/// One scripted step of a plan.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Forward a command that must be accepted.
    Apply(Command),
    /// Forward a command that must be refused.
    Refused(Command),
    /// Run the session clock until nothing is scheduled.
    Settle,
    /// Drive the session against the wall clock.
    WallClock { ms: u64 },
}

#[derive(Debug, Clone)]
pub enum Driver {
    Script(Vec<Step>),
    /// Seeded random commands, `steps` long.
    RandomWalk { steps: usize },
}

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub path: Option<ProcessPath>,
    pub driver: Driver,
    pub tune: Option<fn(&mut ProcessConfig)>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn script(path: ProcessPath, steps: Vec<Step>) -> Self {
        Self {
            path: Some(path),
            driver: Driver::Script(steps),
            tune: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn random_walk(steps: usize) -> Self {
        Self {
            path: None,
            driver: Driver::RandomWalk { steps },
            tune: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tuning(mut self, tune: fn(&mut ProcessConfig)) -> Self {
        self.tune = Some(tune);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Score observed after a command, tagged with the session generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSample {
    pub generation: u64,
    pub stage: Stage,
    pub score: u32,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub path: Option<ProcessPath>,
    pub applied: usize,
    pub rejected: usize,
    /// Script steps whose outcome differed from what the script demanded.
    pub violations: Vec<String>,
    pub samples: Vec<ScoreSample>,
    pub generation: u64,
    pub final_state: ProcessState,
    pub reached: Vec<Stage>,
    pub readings: PanelReadings,
    pub result: ResultSummary,
}

impl SimulationSummary {
    #[must_use]
    pub fn score(&self) -> u32 {
        self.result.score
    }

    #[must_use]
    pub fn final_stage(&self) -> Stage {
        self.final_state.current_stage
    }
}

/// Runs plans against fresh sessions.
pub struct ProcessTester {
    config: ProcessConfig,
    runtime: Runtime,
    verbose: bool,
}

impl ProcessTester {
    /// # Errors
    ///
    /// Returns an error if the wall-clock runtime cannot be started.
    pub fn try_new(config: ProcessConfig, verbose: bool) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .context("failed to start wall-clock runtime")?;
        Ok(Self {
            config,
            runtime,
            verbose,
        })
    }

    #[must_use]
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let mut config = self.config.clone();
        if let Some(tune) = plan.tune {
            tune(&mut config);
        }
        let mut run = Run::new(ProcessSession::new(config), seed);

        match &plan.driver {
            Driver::Script(steps) => {
                for (idx, step) in steps.iter().enumerate() {
                    self.run_step(&mut run, idx + 1, *step);
                }
            }
            Driver::RandomWalk { steps } => {
                let mut walker = RandomWalker::new(ChaCha20Rng::seed_from_u64(seed));
                for _ in 0..*steps {
                    let command = walker.next_command(run.session.state());
                    run.apply(command);
                }
            }
        }

        run.finish()
    }

    fn run_step(&self, run: &mut Run, idx: usize, step: Step) {
        match step {
            Step::Apply(command) => {
                if let Err(err) = run.apply(command) {
                    run.violations
                        .push(format!("step {idx}: {command:?} refused: {err}"));
                }
            }
            Step::Refused(command) => {
                if run.apply(command).is_ok() {
                    run.violations
                        .push(format!("step {idx}: {command:?} should have been refused"));
                }
            }
            Step::Settle => {
                run.session.run_until_idle(SETTLE_LIMIT);
                run.sample();
            }
            Step::WallClock { ms } => {
                let ran = self.runtime.block_on(drive_for(
                    &mut run.session,
                    Duration::from_millis(ms),
                    WALL_CLOCK_RESOLUTION,
                ));
                if self.verbose {
                    println!("     ⏱  wall clock {ms}ms ran {ran} tasks");
                }
                run.sample();
            }
        }
    }
}

struct Run {
    session: ProcessSession,
    seed: u64,
    applied: usize,
    rejected: usize,
    violations: Vec<String>,
    samples: Vec<ScoreSample>,
}

impl Run {
    fn new(session: ProcessSession, seed: u64) -> Self {
        let mut run = Self {
            session,
            seed,
            applied: 0,
            rejected: 0,
            violations: Vec::new(),
            samples: Vec::new(),
        };
        run.sample();
        run
    }

    fn apply(&mut self, command: Command) -> Result<(), cuvee_game::SessionError> {
        let outcome = self.session.apply(command);
        if outcome.is_ok() {
            self.applied += 1;
        } else {
            self.rejected += 1;
        }
        self.sample();
        outcome
    }

    fn sample(&mut self) {
        self.samples.push(ScoreSample {
            generation: self.session.generation(),
            stage: self.session.current_stage(),
            score: self.session.final_score(),
        });
    }

    fn finish(self) -> SimulationSummary {
        let state = self.session.state().clone();
        SimulationSummary {
            seed: self.seed,
            path: state.path,
            applied: self.applied,
            rejected: self.rejected,
            violations: self.violations,
            samples: self.samples,
            generation: self.session.generation(),
            reached: self.session.reached_stages().to_vec(),
            readings: PanelReadings::from_state(&state),
            result: self.session.summary(),
            final_state: state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuvee_game::TimedAction;

    fn tester() -> ProcessTester {
        ProcessTester::try_new(ProcessConfig::default_config(), false).unwrap()
    }

    #[test]
    fn script_records_violations() {
        let plan = SimulationPlan::script(
            ProcessPath::Still,
            vec![
                Step::Apply(Command::Advance),
                Step::Refused(Command::SelectPath {
                    path: ProcessPath::Still,
                }),
            ],
        );
        let summary = tester().run_plan(&plan, 1);
        assert_eq!(summary.violations.len(), 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.applied, 1);
    }

    #[test]
    fn tuning_applies_per_plan() {
        let plan = SimulationPlan::script(
            ProcessPath::Still,
            vec![
                Step::Apply(Command::SelectPath {
                    path: ProcessPath::Still,
                }),
                Step::Apply(Command::Begin {
                    action: TimedAction::Wash,
                }),
                Step::Apply(Command::Wait { ms: 5 }),
            ],
        )
        .with_tuning(|config| config.actions.wash_ms = 5);
        let summary = tester().run_plan(&plan, 1);
        assert!(summary.violations.is_empty());
        assert!(summary.final_state.is_washed);
    }

    #[test]
    fn random_walks_are_reproducible() {
        let plan = SimulationPlan::random_walk(150);
        let first = tester().run_plan(&plan, 99);
        let second = tester().run_plan(&plan, 99);
        assert_eq!(first.final_state, second.final_state);
        assert_eq!(first.samples, second.samples);
        assert_eq!(first.applied + first.rejected, 150);
    }
}
