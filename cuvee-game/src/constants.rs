//! Centralized scoring and domain constants for Cuvée process logic.
//!
//! Penalties and parameter domains define the audit every learner is graded
//! against, so they live in code rather than in the JSON-loadable
//! [`ProcessConfig`](crate::config::ProcessConfig). Timing lives there instead.

// Scoring -------------------------------------------------------------------
pub const INITIAL_SCORE: u32 = 100;
pub const PENALTY_UNWASHED: u32 = 20;
pub const PENALTY_EXCESSIVE_CRUSH: u32 = 15;
pub const PENALTY_WILD_FERMENTATION: u32 = 25;
pub const PENALTY_TEMPERATURE_STRESS: u32 = 15;
pub const PENALTY_ACETIC_SPOILAGE: u32 = 60;
pub const PENALTY_NO_FREEZE: u32 = 40;
pub const PENALTY_OXIDATION: u32 = 50;

// Exit-rule thresholds --------------------------------------------------------
pub const CRUSH_GRANULARITY_BITTER_ABOVE: i32 = 80;
pub const FERMENTATION_STRESS_ABOVE_C: f32 = 28.0;

// Grade boundaries (exclusive lower bounds) -----------------------------------
pub const GRADE_PREMIUM_ABOVE: u32 = 90;
pub const GRADE_TABLE_ABOVE: u32 = 70;
pub const GRADE_BULK_ABOVE: u32 = 40;
pub const POINTS_PER_STAR: u32 = 20;

// Parameter domains -----------------------------------------------------------
pub const CRUSH_GRANULARITY_MIN: i32 = 20;
pub const CRUSH_GRANULARITY_MAX: i32 = 100;
pub const CRUSH_GRANULARITY_DEFAULT: i32 = 45;
pub const FERMENTATION_TEMP_MIN_C: f32 = 0.0;
pub const FERMENTATION_TEMP_MAX_C: f32 = 50.0;
pub const FERMENTATION_TEMP_DEFAULT_C: f32 = 22.0;
pub const AGING_WEEKS_MIN: i32 = 1;
pub const AGING_WEEKS_MAX: i32 = 4;
pub const RIDDLING_MIN: i32 = 0;
pub const RIDDLING_MAX: i32 = 100;
pub const RIDDLING_TURN_STEP: i32 = 25;

// Analytics thresholds --------------------------------------------------------
pub const THERMOSTAT_STALL_BELOW_C: f32 = 18.0;
pub const THERMOSTAT_OVERHEAT_ABOVE_C: f32 = 30.0;
pub const GAUGE_MAX_PCT: f32 = 100.0;
pub const OAK_PROFILE_MIN_WEEKS: i32 = 4;

// Log keys ------------------------------------------------------------------
pub(crate) const LOG_TARGET: &str = "cuvee::session";
