//! Stage advice and glossary shown next to the process view
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::stage::Stage;

pub(crate) const DEFAULT_ADVICE_DATA: &str = include_str!("../assets/advice.json");
pub(crate) const DEFAULT_GLOSSARY_DATA: &str = include_str!("../assets/glossary.json");

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("invalid content json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no advice for stage {0}")]
    MissingAdvice(Stage),
}

/// One hint per stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdviceTable {
    entries: BTreeMap<Stage, String>,
}

impl AdviceTable {
    /// Parse a stage-keyed advice table. Every stage must be covered.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a stage has no advice.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let table: Self = serde_json::from_str(json)?;
        if let Some(missing) = Stage::ALL
            .iter()
            .find(|stage| !table.entries.contains_key(stage))
        {
            return Err(ContentError::MissingAdvice(*missing));
        }
        Ok(table)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        parsed_or_empty("advice", Self::from_json(DEFAULT_ADVICE_DATA))
    }

    /// Advice for `stage`, empty if the table has none.
    #[must_use]
    pub fn advice_for(&self, stage: Stage) -> &str {
        self.entries.get(&stage).map_or("", String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: String,
}

/// Ordered term list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    entries: Vec<GlossaryEntry>,
}

impl Glossary {
    /// # Errors
    ///
    /// Returns an error if the JSON is not a list of term/definition pairs.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        parsed_or_empty("glossary", Self::from_json(DEFAULT_GLOSSARY_DATA))
    }

    #[must_use]
    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    /// Case-insensitive lookup by term.
    #[must_use]
    pub fn lookup(&self, term: &str) -> Option<&GlossaryEntry> {
        self.entries
            .iter()
            .find(|entry| entry.term.eq_ignore_ascii_case(term))
    }
}

fn parsed_or_empty<T: Default>(what: &str, parsed: Result<T, ContentError>) -> T {
    parsed.unwrap_or_else(|err| {
        log::warn!("bundled {what} unusable, falling back to an empty table: {err}");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_advice_covers_every_stage() {
        let advice = AdviceTable::load_from_static();
        assert_eq!(advice.len(), Stage::ALL.len());
        assert!(advice.advice_for(Stage::Fermentation).contains("28"));
        for stage in Stage::ALL {
            assert!(!advice.advice_for(stage).is_empty(), "{stage}");
        }
    }

    #[test]
    fn incomplete_advice_is_rejected() {
        let err = AdviceTable::from_json(r#"{"mode_selection":"pick one"}"#).unwrap_err();
        assert!(matches!(err, ContentError::MissingAdvice(Stage::Preparation)));
        assert!(matches!(AdviceTable::from_json("[]"), Err(ContentError::Json(_))));
    }

    #[test]
    fn malformed_bundle_falls_back_to_empty() {
        let advice = parsed_or_empty("advice", AdviceTable::from_json("{ not json"));
        assert!(advice.is_empty());
        assert_eq!(advice.advice_for(Stage::Bottling), "");
        let glossary = parsed_or_empty("glossary", Glossary::from_json(r#"{"term":1}"#));
        assert!(glossary.entries().is_empty());
    }

    #[test]
    fn bundled_glossary_keeps_order() {
        let glossary = Glossary::load_from_static();
        let terms: Vec<&str> = glossary.entries().iter().map(|e| e.term.as_str()).collect();
        assert_eq!(
            terms,
            vec![
                "Crusher-destemmer",
                "Tirage liqueur",
                "Cryo-disgorgement",
                "Must pump",
                "Filter sheet"
            ]
        );
        assert!(glossary.lookup("must PUMP").is_some());
        assert!(glossary.lookup("barrique").is_none());
    }
}
