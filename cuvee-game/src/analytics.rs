//! Read-only readings for the process side panel.
use serde::{Deserialize, Serialize};

use crate::constants::{
    GAUGE_MAX_PCT, OAK_PROFILE_MIN_WEEKS, THERMOSTAT_OVERHEAT_ABOVE_C, THERMOSTAT_STALL_BELOW_C,
};
use crate::stage::{ProcessPath, Stage};
use crate::state::{FermentationStatus, ProcessState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermostatStatus {
    StallRisk,
    Optimal,
    CriticalOverheat,
}

impl ThermostatStatus {
    #[must_use]
    pub fn from_temp(temp_c: f32) -> Self {
        if temp_c < THERMOSTAT_STALL_BELOW_C {
            Self::StallRisk
        } else if temp_c > THERMOSTAT_OVERHEAT_ABOVE_C {
            Self::CriticalOverheat
        } else {
            Self::Optimal
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StallRisk => "Risk of stuck fermentation",
            Self::Optimal => "Optimal temperature",
            Self::CriticalOverheat => "Critical must overheating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    Sealed,
    OxidationRisk,
}

impl ContainerStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sealed => "Hermetic",
            Self::OxidationRisk => "Oxidation risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clarity {
    Unprocessed,
    DenseSuspension,
    HeavilyCloudy,
    FineFiltering,
    CrystalClear,
}

impl Clarity {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unprocessed => "Unprocessed raw material",
            Self::DenseSuspension => "Dense suspension",
            Self::HeavilyCloudy => "Heavily cloudy",
            Self::FineFiltering => "Fine filtering...",
            Self::CrystalClear => "Crystal clear / brilliant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AromaProfile {
    VinegarDefect,
    CrushedBerries,
    Untreated,
    HighClassBouquet,
    StabilisedBase,
    SecondaryFermentation,
    CookedFruit,
    OakAged,
    CleanVarietal,
    Forming,
}

impl AromaProfile {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VinegarDefect => "Critical defect: sharp smell of vinegar and oxidation.",
            Self::CrushedBerries => "Aroma of freshly crushed berries and seeds.",
            Self::Untreated => "Raw material not processed yet.",
            Self::HighClassBouquet => "High-class bouquet: floral notes, brioche, fine perlage.",
            Self::StabilisedBase => "Stabilised base, ready for sediment removal.",
            Self::SecondaryFermentation => "Secondary fermentation tones, CO2 pressure building.",
            Self::CookedFruit => "Heavy cooked-fruit aroma, excessive alcohol.",
            Self::OakAged => "Noble profile: vanilla, chocolate, soft oak tannins.",
            Self::CleanVarietal => "Clean varietal aroma, high freshness and acidity.",
            Self::Forming => "Organoleptic profile still forming.",
        }
    }
}

/// Everything the side panel shows, computed from one state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelReadings {
    pub temperature_c: f32,
    pub thermostat: ThermostatStatus,
    pub container: ContainerStatus,
    pub clarity: Clarity,
    pub aroma: AromaProfile,
    pub fermentation_gauge_pct: f32,
}

impl PanelReadings {
    #[must_use]
    pub fn from_state(state: &ProcessState) -> Self {
        Self {
            temperature_c: state.fermentation_temp,
            thermostat: ThermostatStatus::from_temp(state.fermentation_temp),
            container: container_status(state),
            clarity: clarity(state),
            aroma: aroma_profile(state),
            fermentation_gauge_pct: fermentation_gauge(state),
        }
    }
}

#[must_use]
pub const fn container_status(state: &ProcessState) -> ContainerStatus {
    if state.is_hermetic {
        ContainerStatus::Sealed
    } else {
        ContainerStatus::OxidationRisk
    }
}

#[must_use]
pub const fn clarity(state: &ProcessState) -> Clarity {
    if state.is_filtered {
        Clarity::CrystalClear
    } else if state.is_filtering {
        Clarity::FineFiltering
    } else if state.is_pressed {
        Clarity::HeavilyCloudy
    } else if state.is_crushed {
        Clarity::DenseSuspension
    } else {
        Clarity::Unprocessed
    }
}

/// First matching profile wins; spoilage masks everything else.
#[must_use]
pub fn aroma_profile(state: &ProcessState) -> AromaProfile {
    if state.fermentation_status == FermentationStatus::Spoiled {
        return AromaProfile::VinegarDefect;
    }
    if state.current_stage == Stage::Preparation {
        return if state.is_crushed {
            AromaProfile::CrushedBerries
        } else {
            AromaProfile::Untreated
        };
    }
    if state.path == Some(ProcessPath::Sparkling) {
        if state.is_disgorged {
            return AromaProfile::HighClassBouquet;
        }
        if state.is_frozen {
            return AromaProfile::StabilisedBase;
        }
        if state.is_bottled {
            return AromaProfile::SecondaryFermentation;
        }
    }
    if state.fermentation_temp > THERMOSTAT_OVERHEAT_ABOVE_C {
        return AromaProfile::CookedFruit;
    }
    if state.is_filtered && state.aging_weeks >= OAK_PROFILE_MIN_WEEKS {
        return AromaProfile::OakAged;
    }
    if state.is_filtered {
        return AromaProfile::CleanVarietal;
    }
    AromaProfile::Forming
}

/// Fermentation progress as a gauge percentage, capped at full.
#[must_use]
pub fn fermentation_gauge(state: &ProcessState) -> f32 {
    state.fermentation_progress.clamp(0.0, GAUGE_MAX_PCT)
}
