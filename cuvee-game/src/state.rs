use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{
    AGING_WEEKS_MAX, AGING_WEEKS_MIN, CRUSH_GRANULARITY_DEFAULT, CRUSH_GRANULARITY_MAX,
    CRUSH_GRANULARITY_MIN, FERMENTATION_TEMP_DEFAULT_C, FERMENTATION_TEMP_MAX_C,
    FERMENTATION_TEMP_MIN_C, RIDDLING_MAX, RIDDLING_MIN,
};
use crate::evaluator::QualityLog;
use crate::stage::{ProcessPath, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FermentationStatus {
    #[default]
    Active,
    Done,
    Spoiled,
}

impl FermentationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Done => "done",
            Self::Spoiled => "spoiled",
        }
    }
}

impl fmt::Display for FermentationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single process aggregate rendered by the presentation layer.
///
/// Fields are public for reading and for building fixtures; a live session
/// only mutates it through [`ProcessSession`](crate::session::ProcessSession).
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessState {
    pub current_stage: Stage,
    #[serde(default)]
    pub path: Option<ProcessPath>,
    // Preparation
    pub is_washed: bool,
    pub is_washing: bool,
    pub is_crushed: bool,
    pub is_crushing: bool,
    pub crush_granularity: i32,
    pub is_yeast_added: bool,
    // Fermentation
    pub is_fermenting: bool,
    pub fermentation_temp: f32,
    pub fermentation_progress: f32,
    /// Number of clock ticks applied while fermenting.
    pub fermentation_ticks: u32,
    pub fermentation_status: FermentationStatus,
    // Filtration
    pub is_pressed: bool,
    pub is_pressing: bool,
    pub press_fill: u32,
    pub is_filtered: bool,
    pub is_filtering: bool,
    // Finishing
    pub aging_weeks: i32,
    pub riddling_progress: i32,
    pub is_frozen: bool,
    pub is_disgorged: bool,
    pub is_bottled: bool,
    pub is_hermetic: bool,
    #[serde(default)]
    pub quality: QualityLog,
}

impl Default for ProcessState {
    fn default() -> Self {
        Self {
            current_stage: Stage::ModeSelection,
            path: None,
            is_washed: false,
            is_washing: false,
            is_crushed: false,
            is_crushing: false,
            crush_granularity: CRUSH_GRANULARITY_DEFAULT,
            is_yeast_added: false,
            is_fermenting: false,
            fermentation_temp: FERMENTATION_TEMP_DEFAULT_C,
            fermentation_progress: 0.0,
            fermentation_ticks: 0,
            fermentation_status: FermentationStatus::Active,
            is_pressed: false,
            is_pressing: false,
            press_fill: 0,
            is_filtered: false,
            is_filtering: false,
            aging_weeks: AGING_WEEKS_MIN,
            riddling_progress: RIDDLING_MIN,
            is_frozen: false,
            is_disgorged: false,
            is_bottled: false,
            is_hermetic: true,
            quality: QualityLog::default(),
        }
    }
}

impl ProcessState {
    /// Whether the fermentation clock should be running.
    #[must_use]
    pub fn fermentation_running(&self) -> bool {
        self.is_fermenting && self.fermentation_status == FermentationStatus::Active
    }

    /// Whether the work of the current stage is finished, i.e. whether a UI
    /// would offer the "next stage" control. Advisory only.
    #[must_use]
    pub fn is_stage_complete(&self) -> bool {
        match self.current_stage {
            Stage::ModeSelection => self.path.is_some(),
            Stage::Preparation => self.is_yeast_added,
            Stage::Fermentation => self.fermentation_status == FermentationStatus::Done,
            Stage::Filtration => self.is_filtered,
            Stage::Tirage | Stage::Bottling => self.is_bottled,
            Stage::Riddling => self.riddling_progress >= RIDDLING_MAX,
            Stage::Freezing => self.is_frozen,
            Stage::Disgorgement => self.is_disgorged,
            Stage::Aging => true,
            Stage::Results => false,
        }
    }

    /// Store a parameter, clamped to its domain, returning the value stored.
    pub(crate) fn apply_parameter(&mut self, param: Parameter) -> Parameter {
        match param {
            Parameter::CrushGranularity(value) => {
                self.crush_granularity = value.clamp(CRUSH_GRANULARITY_MIN, CRUSH_GRANULARITY_MAX);
                Parameter::CrushGranularity(self.crush_granularity)
            }
            Parameter::FermentationTemp(value) => {
                if !value.is_nan() {
                    self.fermentation_temp =
                        value.clamp(FERMENTATION_TEMP_MIN_C, FERMENTATION_TEMP_MAX_C);
                }
                Parameter::FermentationTemp(self.fermentation_temp)
            }
            Parameter::AgingWeeks(value) => {
                self.aging_weeks = value.clamp(AGING_WEEKS_MIN, AGING_WEEKS_MAX);
                Parameter::AgingWeeks(self.aging_weeks)
            }
            Parameter::RiddlingProgress(value) => {
                self.riddling_progress = value.clamp(RIDDLING_MIN, RIDDLING_MAX);
                Parameter::RiddlingProgress(self.riddling_progress)
            }
            Parameter::Hermetic(value) => {
                self.is_hermetic = value;
                Parameter::Hermetic(value)
            }
        }
    }
}

/// A continuously adjustable control (slider or toggle).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "snake_case")]
pub enum Parameter {
    CrushGranularity(i32),
    FermentationTemp(f32),
    AgingWeeks(i32),
    RiddlingProgress(i32),
    Hermetic(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("unknown parameter `{0}`")]
    UnknownName(String),
    #[error("parameter `{name}` cannot take value `{value}`")]
    InvalidValue { name: &'static str, value: String },
}

impl Parameter {
    pub const NAMES: [&'static str; 5] = [
        "crush_granularity",
        "fermentation_temp",
        "aging_weeks",
        "riddling_progress",
        "hermetic",
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CrushGranularity(_) => Self::NAMES[0],
            Self::FermentationTemp(_) => Self::NAMES[1],
            Self::AgingWeeks(_) => Self::NAMES[2],
            Self::RiddlingProgress(_) => Self::NAMES[3],
            Self::Hermetic(_) => Self::NAMES[4],
        }
    }

    /// Build a parameter from the name/value pair a UI control forwards.
    ///
    /// Integer sliders accept fractional input and round it; out-of-range
    /// numbers are accepted here and clamped when applied.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] when the name is unknown or the value does
    /// not parse for that parameter.
    pub fn parse(name: &str, value: &str) -> Result<Self, ParameterError> {
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "crush_granularity" => parse_slider(Self::NAMES[0], value).map(Self::CrushGranularity),
            "fermentation_temp" => value
                .parse::<f32>()
                .ok()
                .filter(|v| !v.is_nan())
                .map(Self::FermentationTemp)
                .ok_or_else(|| invalid(Self::NAMES[1], value)),
            "aging_weeks" => parse_slider(Self::NAMES[2], value).map(Self::AgingWeeks),
            "riddling_progress" => parse_slider(Self::NAMES[3], value).map(Self::RiddlingProgress),
            "hermetic" => parse_toggle(value)
                .map(Self::Hermetic)
                .ok_or_else(|| invalid(Self::NAMES[4], value)),
            other => Err(ParameterError::UnknownName(other.to_string())),
        }
    }
}

impl FromStr for Parameter {
    type Err = ParameterError;

    /// Parse `name=value`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| ParameterError::UnknownName(s.to_string()))?;
        Self::parse(name, value)
    }
}

fn invalid(name: &'static str, value: &str) -> ParameterError {
    ParameterError::InvalidValue {
        name,
        value: value.to_string(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_slider(name: &'static str, value: &str) -> Result<i32, ParameterError> {
    if let Ok(v) = value.parse::<i32>() {
        return Ok(v);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
        .ok_or_else(|| invalid(name, value))
}

fn parse_toggle(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fresh_cellar() {
        let state = ProcessState::default();
        assert_eq!(state.current_stage, Stage::ModeSelection);
        assert!(state.path.is_none());
        assert_eq!(state.crush_granularity, 45);
        assert!((state.fermentation_temp - 22.0).abs() < f32::EPSILON);
        assert_eq!(state.aging_weeks, 1);
        assert!(state.is_hermetic);
        assert_eq!(state.quality.final_score(), 100);
        assert!(!state.fermentation_running());
    }

    #[test]
    fn granularity_is_clamped_for_every_input() {
        let mut state = ProcessState::default();
        for g in [-500, 0, 19, 20, 21, 55, 80, 81, 99, 100, 101, 10_000] {
            state.apply_parameter(Parameter::CrushGranularity(g));
            assert_eq!(state.crush_granularity, g.clamp(20, 100));
        }
    }

    #[test]
    fn other_parameters_clamp_to_their_domains() {
        let mut state = ProcessState::default();
        assert_eq!(
            state.apply_parameter(Parameter::AgingWeeks(9)),
            Parameter::AgingWeeks(4)
        );
        assert_eq!(
            state.apply_parameter(Parameter::RiddlingProgress(-3)),
            Parameter::RiddlingProgress(0)
        );
        state.apply_parameter(Parameter::FermentationTemp(31.5));
        assert!((state.fermentation_temp - 31.5).abs() < f32::EPSILON);
        state.apply_parameter(Parameter::FermentationTemp(f32::NAN));
        assert!((state.fermentation_temp - 31.5).abs() < f32::EPSILON);
        state.apply_parameter(Parameter::FermentationTemp(f32::INFINITY));
        assert!((state.fermentation_temp - FERMENTATION_TEMP_MAX_C).abs() < f32::EPSILON);
        state.apply_parameter(Parameter::Hermetic(false));
        assert!(!state.is_hermetic);
    }

    #[test]
    fn parse_accepts_forwarded_pairs() {
        assert_eq!(
            Parameter::parse("crush_granularity", "90"),
            Ok(Parameter::CrushGranularity(90))
        );
        assert_eq!(
            Parameter::parse("aging_weeks", "2.6"),
            Ok(Parameter::AgingWeeks(3))
        );
        assert_eq!(
            "hermetic=off".parse::<Parameter>(),
            Ok(Parameter::Hermetic(false))
        );
        assert_eq!(
            Parameter::parse("fermentation_temp", "29.5"),
            Ok(Parameter::FermentationTemp(29.5))
        );
        assert!(matches!(
            Parameter::parse("sugar", "3"),
            Err(ParameterError::UnknownName(_))
        ));
        assert!(matches!(
            Parameter::parse("hermetic", "maybe"),
            Err(ParameterError::InvalidValue { .. })
        ));
        assert!(Parameter::parse("fermentation_temp", "NaN").is_err());
    }

    #[test]
    fn stage_completion_follows_stage_work() {
        let mut state = ProcessState {
            current_stage: Stage::Riddling,
            riddling_progress: 75,
            ..ProcessState::default()
        };
        assert!(!state.is_stage_complete());
        state.riddling_progress = 100;
        assert!(state.is_stage_complete());
        state.current_stage = Stage::Aging;
        assert!(state.is_stage_complete());
        state.current_stage = Stage::Fermentation;
        assert!(!state.is_stage_complete());
        state.fermentation_status = FermentationStatus::Done;
        assert!(state.is_stage_complete());
    }
}
