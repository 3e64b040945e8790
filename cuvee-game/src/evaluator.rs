//! Exit-time quality evaluation and the audit log it feeds.
//!
//! [`evaluate_exit`] is a pure function of the stage being left and a state
//! snapshot. The session calls it once per forward transition and folds the
//! findings into the [`QualityLog`] carried by the state.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::constants::{
    CRUSH_GRANULARITY_BITTER_ABOVE, FERMENTATION_STRESS_ABOVE_C, INITIAL_SCORE,
    PENALTY_ACETIC_SPOILAGE, PENALTY_EXCESSIVE_CRUSH, PENALTY_NO_FREEZE, PENALTY_OXIDATION,
    PENALTY_TEMPERATURE_STRESS, PENALTY_UNWASHED, PENALTY_WILD_FERMENTATION,
};
use crate::stage::Stage;
use crate::state::{FermentationStatus, ProcessState};

/// A technological fault detected when leaving a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Defect {
    UnwashedRawMaterial,
    ExcessiveCrushing,
    WildFermentation,
    TemperatureStress,
    AceticSpoilage,
    DisgorgedWithoutFreezing,
    Oxidation,
}

impl Defect {
    #[must_use]
    pub const fn penalty(self) -> u32 {
        match self {
            Self::UnwashedRawMaterial => PENALTY_UNWASHED,
            Self::ExcessiveCrushing => PENALTY_EXCESSIVE_CRUSH,
            Self::WildFermentation => PENALTY_WILD_FERMENTATION,
            Self::TemperatureStress => PENALTY_TEMPERATURE_STRESS,
            Self::AceticSpoilage => PENALTY_ACETIC_SPOILAGE,
            Self::DisgorgedWithoutFreezing => PENALTY_NO_FREEZE,
            Self::Oxidation => PENALTY_OXIDATION,
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::UnwashedRawMaterial => {
                "Unwashed raw material: dust taint and contamination risk"
            }
            Self::ExcessiveCrushing => "Excessive crushing: bitterness from seed damage",
            Self::WildFermentation => "Wild fermentation: impure aroma",
            Self::TemperatureStress => "Temperature stress: aroma loss",
            Self::AceticSpoilage => "Acetic spoilage: product ruined",
            Self::DisgorgedWithoutFreezing => {
                "Disgorgement without freezing: major loss and haze"
            }
            Self::Oxidation => "Oxidation: wine will turn to vinegar within a month",
        }
    }

    /// Translation key for presentation layers that localize the log.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::UnwashedRawMaterial => "defect.unwashed",
            Self::ExcessiveCrushing => "defect.excessive-crush",
            Self::WildFermentation => "defect.wild-fermentation",
            Self::TemperatureStress => "defect.temperature-stress",
            Self::AceticSpoilage => "defect.acetic-spoilage",
            Self::DisgorgedWithoutFreezing => "defect.no-freeze",
            Self::Oxidation => "defect.oxidation",
        }
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Findings for one stage exit; at most three rules fire for any stage.
pub type Findings = SmallVec<[Defect; 3]>;

/// Evaluate the exit rules of `stage` against `state`.
///
/// Rules of one stage are independent and reported in table order.
#[must_use]
pub fn evaluate_exit(stage: Stage, state: &ProcessState) -> Findings {
    let mut findings = Findings::new();
    match stage {
        Stage::Preparation => {
            if !state.is_washed {
                findings.push(Defect::UnwashedRawMaterial);
            }
            if state.crush_granularity > CRUSH_GRANULARITY_BITTER_ABOVE {
                findings.push(Defect::ExcessiveCrushing);
            }
            if !state.is_yeast_added {
                findings.push(Defect::WildFermentation);
            }
        }
        Stage::Fermentation => {
            if state.fermentation_temp > FERMENTATION_STRESS_ABOVE_C {
                findings.push(Defect::TemperatureStress);
            }
            if state.fermentation_status == FermentationStatus::Spoiled {
                findings.push(Defect::AceticSpoilage);
            }
        }
        Stage::Freezing => {
            if !state.is_frozen {
                findings.push(Defect::DisgorgedWithoutFreezing);
            }
        }
        Stage::Bottling => {
            if !state.is_hermetic {
                findings.push(Defect::Oxidation);
            }
        }
        Stage::ModeSelection
        | Stage::Filtration
        | Stage::Tirage
        | Stage::Riddling
        | Stage::Disgorgement
        | Stage::Aging
        | Stage::Results => {}
    }
    findings
}

/// One audit line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub stage: Stage,
    pub defect: Defect,
    pub penalty: u32,
    pub message: String,
}

/// Append-only audit log with the running score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityLog {
    entries: Vec<LogEntry>,
    final_score: u32,
}

impl Default for QualityLog {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            final_score: INITIAL_SCORE,
        }
    }
}

impl QualityLog {
    /// Record a defect. The message is kept even once the score is at zero.
    pub fn record(&mut self, stage: Stage, defect: Defect) {
        let penalty = defect.penalty();
        self.final_score = self.final_score.saturating_sub(penalty);
        self.entries.push(LogEntry {
            stage,
            defect,
            penalty,
            message: defect.message().to_string(),
        });
    }

    pub fn record_all(&mut self, stage: Stage, findings: &[Defect]) {
        for defect in findings {
            self.record(stage, *defect);
        }
    }

    #[must_use]
    pub const fn final_score(&self) -> u32 {
        self.final_score
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.message.as_str())
    }

    #[must_use]
    pub fn total_penalty(&self) -> u32 {
        self.entries.iter().map(|entry| entry.penalty).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn careless_preparation() -> ProcessState {
        ProcessState {
            current_stage: Stage::Preparation,
            is_washed: false,
            crush_granularity: 90,
            is_yeast_added: false,
            ..ProcessState::default()
        }
    }

    #[test]
    fn preparation_rules_fire_in_table_order() {
        let findings = evaluate_exit(Stage::Preparation, &careless_preparation());
        assert_eq!(
            findings.as_slice(),
            &[
                Defect::UnwashedRawMaterial,
                Defect::ExcessiveCrushing,
                Defect::WildFermentation
            ]
        );
        let total: u32 = findings.iter().map(|d| d.penalty()).sum();
        assert_eq!(total, 60);
    }

    #[test]
    fn granularity_of_eighty_is_not_bitter() {
        let state = ProcessState {
            is_washed: true,
            is_yeast_added: true,
            crush_granularity: 80,
            ..ProcessState::default()
        };
        assert!(evaluate_exit(Stage::Preparation, &state).is_empty());
    }

    #[test]
    fn spoilage_penalised_regardless_of_temperature() {
        for temp in [12.0, 22.0, 35.0] {
            let state = ProcessState {
                fermentation_temp: temp,
                fermentation_status: FermentationStatus::Spoiled,
                ..ProcessState::default()
            };
            let findings = evaluate_exit(Stage::Fermentation, &state);
            assert!(findings.contains(&Defect::AceticSpoilage));
        }
        let hot = ProcessState {
            fermentation_temp: 28.5,
            ..ProcessState::default()
        };
        assert_eq!(
            evaluate_exit(Stage::Fermentation, &hot).as_slice(),
            &[Defect::TemperatureStress]
        );
    }

    #[test]
    fn stages_without_rules_are_silent() {
        let state = careless_preparation();
        for stage in [
            Stage::ModeSelection,
            Stage::Filtration,
            Stage::Tirage,
            Stage::Riddling,
            Stage::Disgorgement,
            Stage::Aging,
            Stage::Results,
        ] {
            assert!(evaluate_exit(stage, &state).is_empty(), "{stage}");
        }
    }

    #[test]
    fn freezing_and_bottling_rules() {
        let state = ProcessState {
            is_frozen: false,
            is_hermetic: false,
            ..ProcessState::default()
        };
        assert_eq!(
            evaluate_exit(Stage::Freezing, &state).as_slice(),
            &[Defect::DisgorgedWithoutFreezing]
        );
        assert_eq!(
            evaluate_exit(Stage::Bottling, &state).as_slice(),
            &[Defect::Oxidation]
        );
    }

    #[test]
    fn log_floors_score_but_keeps_messages() {
        let mut log = QualityLog::default();
        log.record(Stage::Fermentation, Defect::AceticSpoilage);
        log.record(Stage::Bottling, Defect::Oxidation);
        assert_eq!(log.final_score(), 0);
        log.record(Stage::Freezing, Defect::DisgorgedWithoutFreezing);
        assert_eq!(log.final_score(), 0);
        assert_eq!(log.len(), 3);
        assert_eq!(log.total_penalty(), 150);
        assert_eq!(
            log.messages().last(),
            Some("Disgorgement without freezing: major loss and haze")
        );
    }
}
