//! Cuvée Process Engine
//!
//! Platform-agnostic core of the Cuvée winemaking simulator: process stages
//! for the still and sparkling paths, the session state machine with its
//! virtual clock, and the exit-time quality audit.
//! This crate has no UI or platform-specific dependencies.

pub mod actions;
pub mod analytics;
pub mod config;
pub mod constants;
pub mod content;
pub mod evaluator;
#[cfg(feature = "async")]
pub mod realtime;
pub mod result;
pub mod scheduler;
pub mod session;
pub mod stage;
pub mod state;

// Re-export commonly used types
pub use actions::{Action, ActionTicket, TimedAction};
pub use analytics::{AromaProfile, Clarity, ContainerStatus, PanelReadings, ThermostatStatus};
pub use config::{ActionTimings, FermentationCfg, ProcessConfig};
pub use content::{AdviceTable, ContentError, Glossary, GlossaryEntry};
pub use evaluator::{Defect, Findings, LogEntry, QualityLog, evaluate_exit};
pub use result::{QualityGrade, ResultSummary, stars_for_score};
pub use scheduler::{ScheduledTask, Scheduler, TaskKind};
pub use session::{Command, ProcessSession, SessionError};
pub use stage::{ProcessPath, Stage};
pub use state::{FermentationStatus, Parameter, ParameterError, ProcessState};

/// Source of process tuning and learner-facing content.
/// Platform-specific implementations should provide this
pub trait ContentLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the process tuning
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_process_config(&self) -> Result<ProcessConfig, Self::Error>;

    /// Load per-stage advice
    ///
    /// # Errors
    ///
    /// Returns an error if the advice table cannot be loaded.
    fn load_advice(&self) -> Result<AdviceTable, Self::Error>;

    /// Load the glossary
    ///
    /// # Errors
    ///
    /// Returns an error if the glossary cannot be loaded.
    fn load_glossary(&self) -> Result<Glossary, Self::Error>;
}

/// Content bundled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticContent;

impl ContentLoader for StaticContent {
    type Error = ContentError;

    fn load_process_config(&self) -> Result<ProcessConfig, Self::Error> {
        Ok(ProcessConfig::default_config())
    }

    fn load_advice(&self) -> Result<AdviceTable, Self::Error> {
        AdviceTable::from_json(content::DEFAULT_ADVICE_DATA)
    }

    fn load_glossary(&self) -> Result<Glossary, Self::Error> {
        Glossary::from_json(content::DEFAULT_GLOSSARY_DATA)
    }
}

/// Entry point for hosts: builds sessions and serves static content.
pub struct WineryEngine<L>
where
    L: ContentLoader,
{
    loader: L,
    advice: AdviceTable,
    glossary: Glossary,
}

impl<L> WineryEngine<L>
where
    L: ContentLoader,
{
    /// Create an engine, loading advice and glossary up front
    ///
    /// # Errors
    ///
    /// Returns an error if either content source fails to load.
    pub fn new(loader: L) -> Result<Self, L::Error> {
        let advice = loader.load_advice()?;
        let glossary = loader.load_glossary()?;
        Ok(Self {
            loader,
            advice,
            glossary,
        })
    }

    /// Start a fresh session with the loader's process tuning.
    ///
    /// # Errors
    ///
    /// Returns an error if the process configuration cannot be loaded.
    pub fn create_session(&self) -> Result<ProcessSession, L::Error> {
        let config = self.loader.load_process_config()?;
        Ok(ProcessSession::new(config))
    }

    #[must_use]
    pub fn advice_for(&self, stage: Stage) -> &str {
        self.advice.advice_for(stage)
    }

    #[must_use]
    pub const fn glossary(&self) -> &Glossary {
        &self.glossary
    }
}

impl WineryEngine<StaticContent> {
    /// Engine over the bundled content.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled JSON is invalid.
    pub fn bundled() -> Result<Self, ContentError> {
        Self::new(StaticContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FastLoader;

    impl ContentLoader for FastLoader {
        type Error = Infallible;

        fn load_process_config(&self) -> Result<ProcessConfig, Self::Error> {
            let mut config = ProcessConfig::default_config();
            config.actions.wash_ms = 10;
            Ok(config)
        }

        fn load_advice(&self) -> Result<AdviceTable, Self::Error> {
            Ok(AdviceTable::default())
        }

        fn load_glossary(&self) -> Result<Glossary, Self::Error> {
            Ok(Glossary::default())
        }
    }

    #[test]
    fn engine_sessions_use_loader_config() {
        let engine = WineryEngine::new(FastLoader).unwrap();
        let mut session = engine.create_session().unwrap();
        session.select_path(ProcessPath::Still).unwrap();
        session.begin_timed_action(TimedAction::Wash).unwrap();
        session.advance_clock(std::time::Duration::from_millis(10));
        assert!(session.state().is_washed);
        assert_eq!(engine.advice_for(Stage::Preparation), "");
        assert!(engine.glossary().entries().is_empty());
    }

    #[test]
    fn bundled_engine_serves_content() {
        let engine = WineryEngine::bundled().unwrap();
        assert!(engine.advice_for(Stage::Bottling).contains("Oxygen"));
        assert_eq!(engine.glossary().entries().len(), 5);
        let session = engine.create_session().unwrap();
        assert_eq!(session.current_stage(), Stage::ModeSelection);
        assert_eq!(session.final_score(), 100);
    }
}
