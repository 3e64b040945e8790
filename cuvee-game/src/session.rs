use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::actions::{Action, ActionTicket, TimedAction};
use crate::config::ProcessConfig;
use crate::constants::{LOG_TARGET, RIDDLING_MAX, RIDDLING_TURN_STEP};
use crate::evaluator::evaluate_exit;
use crate::result::ResultSummary;
use crate::scheduler::{ScheduledTask, Scheduler, TaskKind};
use crate::stage::{ProcessPath, Stage};
use crate::state::{FermentationStatus, Parameter, ProcessState};

/// A command that was refused. Refusals never change the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("production path already chosen ({0})")]
    PathAlreadyChosen(ProcessPath),
    #[error("no production path chosen yet")]
    PathNotChosen,
    #[error("{what} is only available during {expected} (currently {actual})")]
    WrongStage {
        what: &'static str,
        expected: Stage,
        actual: Stage,
    },
    #[error("already at the final stage")]
    TerminalStage,
    #[error("stage {stage} is not part of the {path} path")]
    NotOnPath { stage: Stage, path: ProcessPath },
    #[error("stage {0} has not been reached yet")]
    StageNotReached(Stage),
    #[error("{0} is already in progress")]
    ActionInProgress(TimedAction),
    #[error("{action} requires {requires} first")]
    MissingPrerequisite {
        action: &'static str,
        requires: &'static str,
    },
    #[error("{0} has already been done")]
    AlreadyDone(&'static str),
    #[error("fermentation clock is not running")]
    FermentationInactive,
    #[error("stale completion for {0}")]
    StaleCallback(TimedAction),
}

/// A user intent forwarded by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SelectPath { path: ProcessPath },
    SetParameter { parameter: Parameter },
    Begin { action: TimedAction },
    Perform { action: Action },
    TickFermentation,
    Advance,
    NavigateTo { stage: Stage },
    /// Let virtual time pass.
    Wait { ms: u64 },
    Restart,
}

/// Process state machine for one learner session.
///
/// Owns the [`ProcessState`] and the virtual clock. Every mutation goes
/// through the methods below; refused commands return a [`SessionError`]
/// and leave the state exactly as it was.
#[derive(Debug, Clone)]
pub struct ProcessSession {
    config: ProcessConfig,
    state: ProcessState,
    scheduler: Scheduler,
    generation: u64,
    furthest: Option<usize>,
    pending_action: Option<ActionTicket>,
    next_serial: u64,
    fermentation_run: u64,
}

impl Default for ProcessSession {
    fn default() -> Self {
        Self::new(ProcessConfig::default_config())
    }
}

impl ProcessSession {
    #[must_use]
    pub fn new(config: ProcessConfig) -> Self {
        Self {
            config,
            state: ProcessState::default(),
            scheduler: Scheduler::new(),
            generation: 0,
            furthest: None,
            pending_action: None,
            next_serial: 0,
            fermentation_run: 0,
        }
    }

    /// Borrow the current state snapshot.
    #[must_use]
    pub const fn state(&self) -> &ProcessState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &ProcessConfig {
        &self.config
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Current virtual time of the session clock.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.scheduler.now()
    }

    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    #[must_use]
    pub const fn pending_action(&self) -> Option<ActionTicket> {
        self.pending_action
    }

    #[must_use]
    pub const fn current_stage(&self) -> Stage {
        self.state.current_stage
    }

    #[must_use]
    pub const fn final_score(&self) -> u32 {
        self.state.quality.final_score()
    }

    /// Ordered working sequence of the chosen path; empty before selection.
    #[must_use]
    pub fn stage_sequence(&self) -> &'static [Stage] {
        self.state.path.map_or(&[] as &[Stage], ProcessPath::stages)
    }

    /// Stages already reached, in path order.
    #[must_use]
    pub fn reached_stages(&self) -> &'static [Stage] {
        match (self.state.path, self.furthest) {
            (Some(path), Some(idx)) => &path.stages()[..=idx],
            _ => &[],
        }
    }

    #[must_use]
    pub fn is_stage_complete(&self) -> bool {
        self.state.is_stage_complete()
    }

    #[must_use]
    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_state(&self.state)
    }

    /// Choose the production path and enter the first working stage.
    ///
    /// # Errors
    ///
    /// Refused once a path is chosen or outside mode selection.
    pub fn select_path(&mut self, path: ProcessPath) -> Result<Stage, SessionError> {
        if let Some(chosen) = self.state.path {
            return reject(SessionError::PathAlreadyChosen(chosen));
        }
        self.require_stage("path selection", Stage::ModeSelection)?;
        self.state.path = Some(path);
        self.state.current_stage = Stage::Preparation;
        self.furthest = Some(0);
        log::info!(target: LOG_TARGET, "path selected: {path}");
        Ok(self.state.current_stage)
    }

    /// Set a control value, clamped to its domain. Returns the stored value.
    pub fn set_parameter(&mut self, parameter: Parameter) -> Parameter {
        let stored = self.state.apply_parameter(parameter);
        if stored != parameter {
            log::debug!(target: LOG_TARGET, "clamped {parameter:?} to {stored:?}");
        }
        stored
    }

    /// Start a timed action and schedule its completion.
    ///
    /// Starting an action while a different one is pending supersedes the
    /// pending one: its completion will never be applied.
    ///
    /// # Errors
    ///
    /// Refused outside the action's stage, while the same action is already
    /// running, once it has completed, or before its prerequisite completed.
    pub fn begin_timed_action(
        &mut self,
        action: TimedAction,
    ) -> Result<ActionTicket, SessionError> {
        self.require_stage(action.as_str(), action.stage())?;
        if self.timed_action_done(action) {
            return reject(SessionError::AlreadyDone(action.as_str()));
        }
        if self.timed_action_running(action) {
            return reject(SessionError::ActionInProgress(action));
        }
        if let Some(pre) = action.prerequisite()
            && !self.timed_action_done(pre)
        {
            return reject(SessionError::MissingPrerequisite {
                action: action.as_str(),
                requires: pre.as_str(),
            });
        }

        if let Some(superseded) = self.pending_action.take() {
            self.cancel_action(superseded);
            log::debug!(target: LOG_TARGET, "{} superseded by {action}", superseded.action);
        }

        let ticket = ActionTicket {
            action,
            generation: self.generation,
            serial: self.next_serial,
        };
        self.next_serial += 1;
        self.set_running(action, true);
        if action == TimedAction::Press {
            self.state.press_fill = 0;
        }
        self.pending_action = Some(ticket);
        self.scheduler.schedule_in(
            action.step_delay(&self.config.actions),
            self.generation,
            TaskKind::ActionStep(ticket),
        );
        log::debug!(target: LOG_TARGET, "{action} started");
        Ok(ticket)
    }

    /// Complete a timed action immediately, for callers that run their own
    /// timers. A ticket from a restarted or superseded action is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::StaleCallback`] for any ticket that is not the
    /// pending one.
    pub fn complete_timed_action(&mut self, ticket: ActionTicket) -> Result<(), SessionError> {
        if self.pending_action != Some(ticket) {
            return reject(SessionError::StaleCallback(ticket.action));
        }
        self.cancel_queued_steps(ticket);
        self.finish_action(ticket);
        Ok(())
    }

    /// Apply an instant action.
    ///
    /// # Errors
    ///
    /// Refused outside the action's stage or when the action has nothing
    /// left to do.
    pub fn perform(&mut self, action: Action) -> Result<(), SessionError> {
        self.require_stage(action.as_str(), action.stage())?;
        match action {
            Action::AddYeast => {
                if self.state.is_yeast_added {
                    return reject(SessionError::AlreadyDone(action.as_str()));
                }
                if !self.state.is_crushed {
                    return reject(SessionError::MissingPrerequisite {
                        action: action.as_str(),
                        requires: TimedAction::Crush.as_str(),
                    });
                }
                self.state.is_yeast_added = true;
            }
            Action::StartFermentation => {
                if self.state.is_fermenting {
                    return reject(SessionError::AlreadyDone(action.as_str()));
                }
                if self.state.fermentation_status != FermentationStatus::Active {
                    return reject(SessionError::FermentationInactive);
                }
                self.state.is_fermenting = true;
                self.start_fermentation_clock();
            }
            Action::StopFermentation => {
                if !self.state.is_fermenting {
                    return reject(SessionError::FermentationInactive);
                }
                self.state.is_fermenting = false;
                self.stop_fermentation_clock();
            }
            Action::FillTirage | Action::RunBottlingLine => {
                if self.state.is_bottled {
                    return reject(SessionError::AlreadyDone(action.as_str()));
                }
                self.state.is_bottled = true;
            }
            Action::RiddleTurn => {
                if self.state.riddling_progress >= RIDDLING_MAX {
                    return reject(SessionError::AlreadyDone(action.as_str()));
                }
                let turned = self.state.riddling_progress + RIDDLING_TURN_STEP;
                self.state.apply_parameter(Parameter::RiddlingProgress(turned));
            }
            Action::FreezeNeck => {
                if self.state.is_frozen {
                    return reject(SessionError::AlreadyDone(action.as_str()));
                }
                self.state.is_frozen = true;
            }
            Action::Disgorge => {
                if self.state.is_disgorged {
                    return reject(SessionError::AlreadyDone(action.as_str()));
                }
                self.state.is_disgorged = true;
            }
            Action::ToggleHermetic => {
                self.state.is_hermetic = !self.state.is_hermetic;
            }
        }
        log::debug!(target: LOG_TARGET, "{action} performed");
        Ok(())
    }

    /// Apply one fermentation clock tick.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::FermentationInactive`] unless the tank is
    /// fermenting with status active.
    pub fn tick_fermentation(&mut self) -> Result<FermentationStatus, SessionError> {
        if !self.state.fermentation_running() {
            return reject(SessionError::FermentationInactive);
        }
        let cfg = &self.config.fermentation;
        let speed = cfg.speed_for(self.state.fermentation_temp);
        let progress = self.state.fermentation_progress + speed;
        let status = if progress >= cfg.spoiled_at {
            FermentationStatus::Spoiled
        } else if progress >= cfg.done_at {
            FermentationStatus::Done
        } else {
            FermentationStatus::Active
        };
        self.state.fermentation_progress = progress;
        self.state.fermentation_ticks += 1;
        self.state.fermentation_status = status;
        match status {
            FermentationStatus::Active => {}
            FermentationStatus::Done => {
                self.stop_fermentation_clock();
                log::info!(target: LOG_TARGET, "fermentation done at {progress:.1}");
            }
            FermentationStatus::Spoiled => {
                self.stop_fermentation_clock();
                log::warn!(target: LOG_TARGET, "fermentation spoiled at {progress:.1}");
            }
        }
        Ok(status)
    }

    /// Leave the current stage: score it, then move to the next stage.
    ///
    /// Every forward step is scored, including one that re-leaves a stage
    /// reached again through [`navigate_to`](Self::navigate_to).
    ///
    /// # Errors
    ///
    /// Refused before a path is chosen and at the terminal stage.
    pub fn advance(&mut self) -> Result<Stage, SessionError> {
        let Some(path) = self.state.path else {
            return reject(SessionError::PathNotChosen);
        };
        let leaving = self.state.current_stage;
        let Some(next) = path.next_after(leaving) else {
            return reject(SessionError::TerminalStage);
        };

        let findings = evaluate_exit(leaving, &self.state);
        for defect in &findings {
            log::warn!(
                target: LOG_TARGET,
                "{leaving}: {} (-{})",
                defect.message(),
                defect.penalty()
            );
        }
        self.state.quality.record_all(leaving, &findings);

        self.state.current_stage = next;
        let idx = path.position(next);
        self.furthest = self.furthest.max(idx);
        log::info!(
            target: LOG_TARGET,
            "{leaving} -> {next} (score {})",
            self.state.quality.final_score()
        );
        Ok(next)
    }

    /// Jump to an already-reached stage for review. Nothing is scored.
    ///
    /// # Errors
    ///
    /// Refused before a path is chosen, for stages off the path and for
    /// stages not reached yet.
    pub fn navigate_to(&mut self, stage: Stage) -> Result<(), SessionError> {
        let Some(path) = self.state.path else {
            return reject(SessionError::PathNotChosen);
        };
        let Some(idx) = path.position(stage) else {
            return reject(SessionError::NotOnPath { stage, path });
        };
        if self.furthest.is_none_or(|furthest| idx > furthest) {
            return reject(SessionError::StageNotReached(stage));
        }
        self.state.current_stage = stage;
        log::debug!(target: LOG_TARGET, "navigated to {stage}");
        Ok(())
    }

    /// Reset everything to a fresh session. Outstanding timers are dropped
    /// and any callback issued before the restart becomes stale.
    pub fn restart(&mut self) {
        self.generation += 1;
        self.fermentation_run += 1;
        self.scheduler.clear();
        self.state = ProcessState::default();
        self.furthest = None;
        self.pending_action = None;
        log::info!(
            target: LOG_TARGET,
            "session restarted (generation {})",
            self.generation
        );
    }

    /// Let `elapsed` virtual time pass, running every task that falls due.
    /// Returns how many tasks ran.
    pub fn advance_clock(&mut self, elapsed: Duration) -> usize {
        let until = self.scheduler.now() + elapsed;
        let mut ran = 0;
        while let Some(task) = self.scheduler.pop_due(until) {
            self.run_task(task);
            ran += 1;
        }
        self.scheduler.settle(until);
        ran
    }

    /// Run the clock until no task is queued or `limit` virtual time has
    /// passed. Returns the time that passed.
    pub fn run_until_idle(&mut self, limit: Duration) -> Duration {
        let start = self.scheduler.now();
        let horizon = start + limit;
        while let Some(due) = self.scheduler.next_due() {
            if due > horizon {
                break;
            }
            self.advance_clock(due.saturating_sub(self.scheduler.now()));
        }
        self.scheduler.now() - start
    }

    /// Dispatch a forwarded user intent.
    ///
    /// # Errors
    ///
    /// Propagates the refusal of the underlying operation.
    pub fn apply(&mut self, command: Command) -> Result<(), SessionError> {
        match command {
            Command::SelectPath { path } => self.select_path(path).map(drop),
            Command::SetParameter { parameter } => {
                self.set_parameter(parameter);
                Ok(())
            }
            Command::Begin { action } => self.begin_timed_action(action).map(drop),
            Command::Perform { action } => self.perform(action),
            Command::TickFermentation => self.tick_fermentation().map(drop),
            Command::Advance => self.advance().map(drop),
            Command::NavigateTo { stage } => self.navigate_to(stage),
            Command::Wait { ms } => {
                self.advance_clock(Duration::from_millis(ms));
                Ok(())
            }
            Command::Restart => {
                self.restart();
                Ok(())
            }
        }
    }

    fn require_stage(&self, what: &'static str, expected: Stage) -> Result<(), SessionError> {
        let actual = self.state.current_stage;
        if actual == expected {
            Ok(())
        } else {
            reject(SessionError::WrongStage {
                what,
                expected,
                actual,
            })
        }
    }

    fn run_task(&mut self, task: ScheduledTask) {
        if task.generation != self.generation {
            log::debug!(target: LOG_TARGET, "dropping task from generation {}", task.generation);
            return;
        }
        match task.kind {
            TaskKind::ActionStep(ticket) => self.step_action(ticket),
            TaskKind::FermentationTick { run } => {
                if run != self.fermentation_run {
                    log::debug!(target: LOG_TARGET, "dropping tick from clock run {run}");
                    return;
                }
                if let Ok(FermentationStatus::Active) = self.tick_fermentation() {
                    self.schedule_fermentation_tick();
                }
            }
        }
    }

    fn step_action(&mut self, ticket: ActionTicket) {
        if self.pending_action != Some(ticket) {
            log::debug!(target: LOG_TARGET, "dropping stale {} step", ticket.action);
            return;
        }
        if ticket.action == TimedAction::Press {
            let timings = &self.config.actions;
            let fill = (self.state.press_fill + timings.press_step).min(timings.press_target);
            self.state.press_fill = fill;
            if fill < timings.press_target {
                self.scheduler.schedule_in(
                    ticket.action.step_delay(timings),
                    self.generation,
                    TaskKind::ActionStep(ticket),
                );
                return;
            }
        }
        self.finish_action(ticket);
    }

    fn finish_action(&mut self, ticket: ActionTicket) {
        self.pending_action = None;
        self.set_running(ticket.action, false);
        match ticket.action {
            TimedAction::Wash => self.state.is_washed = true,
            TimedAction::Crush => self.state.is_crushed = true,
            TimedAction::Press => {
                self.state.press_fill = self.config.actions.press_target;
                self.state.is_pressed = true;
            }
            TimedAction::Filter => self.state.is_filtered = true,
        }
        log::debug!(target: LOG_TARGET, "{} complete", ticket.action);
    }

    fn cancel_action(&mut self, ticket: ActionTicket) {
        self.cancel_queued_steps(ticket);
        self.set_running(ticket.action, false);
        if ticket.action == TimedAction::Press {
            self.state.press_fill = 0;
        }
    }

    fn cancel_queued_steps(&mut self, ticket: ActionTicket) {
        self.scheduler
            .cancel_where(|task| task.kind == TaskKind::ActionStep(ticket));
    }

    fn timed_action_done(&self, action: TimedAction) -> bool {
        match action {
            TimedAction::Wash => self.state.is_washed,
            TimedAction::Crush => self.state.is_crushed,
            TimedAction::Press => self.state.is_pressed,
            TimedAction::Filter => self.state.is_filtered,
        }
    }

    fn timed_action_running(&self, action: TimedAction) -> bool {
        match action {
            TimedAction::Wash => self.state.is_washing,
            TimedAction::Crush => self.state.is_crushing,
            TimedAction::Press => self.state.is_pressing,
            TimedAction::Filter => self.state.is_filtering,
        }
    }

    fn set_running(&mut self, action: TimedAction, running: bool) {
        let flag = match action {
            TimedAction::Wash => &mut self.state.is_washing,
            TimedAction::Crush => &mut self.state.is_crushing,
            TimedAction::Press => &mut self.state.is_pressing,
            TimedAction::Filter => &mut self.state.is_filtering,
        };
        *flag = running;
    }

    fn start_fermentation_clock(&mut self) {
        self.fermentation_run += 1;
        self.schedule_fermentation_tick();
        log::info!(target: LOG_TARGET, "fermentation started");
    }

    fn stop_fermentation_clock(&mut self) {
        let run = self.fermentation_run;
        self.fermentation_run += 1;
        self.scheduler
            .cancel_where(|task| task.kind == TaskKind::FermentationTick { run });
    }

    fn schedule_fermentation_tick(&mut self) {
        self.scheduler.schedule_in(
            self.config.fermentation.tick_period(),
            self.generation,
            TaskKind::FermentationTick {
                run: self.fermentation_run,
            },
        );
    }
}

fn reject<T>(err: SessionError) -> Result<T, SessionError> {
    log::debug!(target: LOG_TARGET, "ignored: {err}");
    Err(err)
}
