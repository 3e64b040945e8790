//! Process stages and the production paths that order them.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Production route chosen once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessPath {
    Still,
    Sparkling,
}

impl ProcessPath {
    pub const ALL: [Self; 2] = [Self::Still, Self::Sparkling];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Still => "still",
            Self::Sparkling => "sparkling",
        }
    }

    /// Working sequence for this path, ending with [`Stage::Results`].
    #[must_use]
    pub const fn stages(self) -> &'static [Stage] {
        match self {
            Self::Still => STILL_SEQUENCE,
            Self::Sparkling => SPARKLING_SEQUENCE,
        }
    }

    /// Position of `stage` within this path's working sequence.
    #[must_use]
    pub fn position(self, stage: Stage) -> Option<usize> {
        self.stages().iter().position(|s| *s == stage)
    }

    /// Stage that follows `stage`, or `None` at the end of the sequence or
    /// when `stage` is not on this path.
    #[must_use]
    pub fn next_after(self, stage: Stage) -> Option<Stage> {
        let idx = self.position(stage)?;
        self.stages().get(idx + 1).copied()
    }

    #[must_use]
    pub fn contains(self, stage: Stage) -> bool {
        self.position(stage).is_some()
    }
}

impl fmt::Display for ProcessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessPath {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "still" => Ok(Self::Still),
            "sparkling" => Ok(Self::Sparkling),
            _ => Err(()),
        }
    }
}

/// One discrete phase of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ModeSelection,
    Preparation,
    Fermentation,
    Filtration,
    Tirage,
    Riddling,
    Freezing,
    Disgorgement,
    Aging,
    Bottling,
    Results,
}

const STILL_SEQUENCE: &[Stage] = &[
    Stage::Preparation,
    Stage::Fermentation,
    Stage::Filtration,
    Stage::Aging,
    Stage::Bottling,
    Stage::Results,
];

const SPARKLING_SEQUENCE: &[Stage] = &[
    Stage::Preparation,
    Stage::Fermentation,
    Stage::Filtration,
    Stage::Tirage,
    Stage::Riddling,
    Stage::Freezing,
    Stage::Disgorgement,
    Stage::Results,
];

impl Stage {
    pub const ALL: [Self; 11] = [
        Self::ModeSelection,
        Self::Preparation,
        Self::Fermentation,
        Self::Filtration,
        Self::Tirage,
        Self::Riddling,
        Self::Freezing,
        Self::Disgorgement,
        Self::Aging,
        Self::Bottling,
        Self::Results,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ModeSelection => "mode_selection",
            Self::Preparation => "preparation",
            Self::Fermentation => "fermentation",
            Self::Filtration => "filtration",
            Self::Tirage => "tirage",
            Self::Riddling => "riddling",
            Self::Freezing => "freezing",
            Self::Disgorgement => "disgorgement",
            Self::Aging => "aging",
            Self::Bottling => "bottling",
            Self::Results => "results",
        }
    }

    /// Short label shown in the stage navigation bar.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ModeSelection => "Wine type",
            Self::Preparation => "Raw material",
            Self::Fermentation => "Fermentation",
            Self::Filtration => "Filtration",
            Self::Tirage => "Tirage",
            Self::Riddling => "Riddling",
            Self::Freezing => "Freezing",
            Self::Disgorgement => "Disgorgement",
            Self::Aging => "Aging",
            Self::Bottling => "Bottling",
            Self::Results => "Results",
        }
    }

    /// Whether the stage belongs to a working sequence (i.e. is neither the
    /// entry selector nor the terminal audit).
    #[must_use]
    pub const fn is_working(self) -> bool {
        !matches!(self, Self::ModeSelection | Self::Results)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}
