//! Assessment reports for the presentation layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::extraction::{Entity, ExtractedData};
use crate::types::Outcome;
use crate::validator::Validator;

/// What a reader of one scan report is shown: the outcome plus the
/// recognized entities it was computed from.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    /// The validation outcome
    pub outcome: Outcome,

    /// Recognized entities, in recognition order
    pub entities: Vec<Entity>,

    /// When the assessment was made
    pub assessed_at: DateTime<Utc>,
}

impl Assessment {
    /// Validate recognized entities (last occurrence of a label wins).
    pub fn from_entities(validator: &Validator<'_>, entities: Vec<Entity>) -> Self {
        let extracted = ExtractedData::from_entities(&entities);
        Self {
            outcome: validator.validate(&extracted),
            entities,
            assessed_at: Utc::now(),
        }
    }

    /// One-line summary of the outcome.
    pub fn summary(&self) -> String {
        summarize(&self.outcome)
    }
}

/// One-line summary of an outcome, e.g.
/// `Fetus is not in good condition. Issues found: LIQUOR is missing ...`.
pub fn summarize(outcome: &Outcome) -> String {
    match outcome {
        Outcome::UnknownProfile { .. } => "Unknown trimester".to_string(),
        Outcome::Assessed { verdict } if verdict.is_healthy() => {
            "Fetus is in good condition".to_string()
        }
        Outcome::Assessed { verdict } => format!(
            "Fetus is not in good condition. Issues found: {}",
            verdict.messages().join(", ")
        ),
    }
}
