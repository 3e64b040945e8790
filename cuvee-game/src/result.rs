//! Final audit grading
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    GRADE_BULK_ABOVE, GRADE_PREMIUM_ABOVE, GRADE_TABLE_ABOVE, INITIAL_SCORE, POINTS_PER_STAR,
};
use crate::evaluator::LogEntry;
use crate::stage::ProcessPath;
use crate::state::ProcessState;

/// Classification of a finished batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    /// Score above 90
    Premium,
    /// Score in (70, 90]
    Table,
    /// Score in (40, 70]
    BulkMaterial,
    /// Score of 40 or less
    TechnicalReject,
}

impl QualityGrade {
    #[must_use]
    pub const fn from_score(score: u32) -> Self {
        if score > GRADE_PREMIUM_ABOVE {
            Self::Premium
        } else if score > GRADE_TABLE_ABOVE {
            Self::Table
        } else if score > GRADE_BULK_ABOVE {
            Self::BulkMaterial
        } else {
            Self::TechnicalReject
        }
    }

    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::Premium => "Premium product",
            Self::Table => "Table wine",
            Self::BulkMaterial => "Must/bulk wine material",
            Self::TechnicalReject => "Technical reject",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Premium => "Process sheet followed to the letter. Ready for market release.",
            Self::Table => "Good quality, with remarks on the process.",
            Self::BulkMaterial => "Needs correction by blending or reprocessing.",
            Self::TechnicalReject => "Gross process violations cost the whole batch.",
        }
    }
}

/// Stars out of five on the results card: one per full 20 points.
#[must_use]
pub fn stars_for_score(score: u32) -> u8 {
    u8::try_from(score.min(INITIAL_SCORE) / POINTS_PER_STAR).unwrap_or(u8::MAX)
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.headline())
    }
}

/// Everything the results screen shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub path: Option<ProcessPath>,
    pub score: u32,
    pub grade: QualityGrade,
    pub headline: String,
    pub description: String,
    pub stars: u8,
    pub entries: Vec<LogEntry>,
}

impl ResultSummary {
    #[must_use]
    pub fn from_state(state: &ProcessState) -> Self {
        let score = state.quality.final_score();
        let grade = QualityGrade::from_score(score);
        Self {
            path: state.path,
            score,
            grade,
            headline: grade.headline().to_string(),
            description: grade.description().to_string(),
            stars: stars_for_score(score),
            entries: state.quality.entries().to_vec(),
        }
    }

    /// Whether the batch passed the audit without a single remark.
    #[must_use]
    pub fn is_flawless(&self) -> bool {
        self.entries.is_empty()
    }
}
