//! Timing and fermentation tuning.
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Durations of the timed cellar actions, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTimings {
    pub wash_ms: u64,
    pub crush_ms: u64,
    pub filter_ms: u64,
    /// Interval between two press fill steps.
    pub press_step_ms: u64,
    /// Fill level added per press step.
    pub press_step: u32,
    /// Fill level at which pressing is complete.
    pub press_target: u32,
}

/// Fermentation clock and speed curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FermentationCfg {
    pub tick_ms: u64,
    pub done_at: f32,
    pub spoiled_at: f32,
    pub optimal_min_c: f32,
    pub optimal_max_c: f32,
    pub overheat_above_c: f32,
    pub base_speed: f32,
    pub optimal_speed: f32,
    pub overheat_speed: f32,
}

/// Full process configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub actions: ActionTimings,
    pub fermentation: FermentationCfg,
}

impl Default for ActionTimings {
    fn default() -> Self {
        Self {
            wash_ms: 2_000,
            crush_ms: 2_500,
            filter_ms: 3_000,
            press_step_ms: 40,
            press_step: 2,
            press_target: 80,
        }
    }
}

impl Default for FermentationCfg {
    fn default() -> Self {
        Self {
            tick_ms: 500,
            done_at: 100.0,
            spoiled_at: 140.0,
            optimal_min_c: 20.0,
            optimal_max_c: 25.0,
            overheat_above_c: 28.0,
            base_speed: 1.0,
            optimal_speed: 2.0,
            overheat_speed: 4.0,
        }
    }
}

impl FermentationCfg {
    /// Progress added by one tick at `temp_c`.
    ///
    /// The overheat rule takes precedence over the optimal window so that a
    /// widened window can never mask it.
    #[must_use]
    pub fn speed_for(&self, temp_c: f32) -> f32 {
        if temp_c > self.overheat_above_c {
            self.overheat_speed
        } else if (self.optimal_min_c..=self.optimal_max_c).contains(&temp_c) {
            self.optimal_speed
        } else {
            self.base_speed
        }
    }

    #[must_use]
    pub const fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl ProcessConfig {
    /// Get default configuration
    #[must_use]
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Parse a configuration override from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a full configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            actions: ActionTimings::default(),
            fermentation: FermentationCfg::default(),
        }
    }
}
