//! Deterministic entity recognition over OCR text.
//!
//! Statistical NER models are external collaborators. This recognizer is the
//! rule-based fallback: it knows the labels of a profile store and finds
//! them in text with regular expressions. Same text, same entities.

pub mod patterns;

use regex::Regex;
use tracing::debug;

use crate::extraction::Entity;
use crate::profile::ReferenceProfileStore;
use crate::types::ExpectedValue;

use patterns::{
    decimal_point, label_pattern, normalize_whitespace, phrase_pattern, NUMERIC_VALUE, WORD_VALUE,
};

/// One label and the pattern that finds its value.
#[derive(Debug, Clone)]
struct LabelMatcher {
    label: String,
    pattern: Regex,
    numeric: bool,
}

/// One profile name and the pattern that finds it.
#[derive(Debug, Clone)]
struct ProfileMatcher {
    name: String,
    pattern: Regex,
}

/// Rule-based recognizer for the labels of a profile store.
#[derive(Debug, Clone)]
pub struct PatternRecognizer {
    selector_label: String,
    profiles: Vec<ProfileMatcher>,
    labels: Vec<LabelMatcher>,
}

impl PatternRecognizer {
    /// Build a recognizer for every label in `store`.
    ///
    /// Range labels match numbers and category labels match single words.
    /// A label that is a range in one profile and a category in another
    /// uses the first definition in catalog order.
    pub fn for_store(store: &ReferenceProfileStore) -> Result<Self, regex::Error> {
        let selector_label = store.selector_label().to_string();

        let profiles = store
            .profiles()
            .map(|p| {
                Ok(ProfileMatcher {
                    name: p.name().to_string(),
                    pattern: Regex::new(&phrase_pattern(p.name()))?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let mut labels: Vec<LabelMatcher> = Vec::new();
        for measurement in store.profiles().flat_map(|p| p.measurements()) {
            if measurement.label == selector_label
                || labels.iter().any(|l| l.label == measurement.label)
            {
                continue;
            }

            let numeric = matches!(measurement.expected, ExpectedValue::Range(..));
            let value = if numeric { NUMERIC_VALUE } else { WORD_VALUE };
            labels.push(LabelMatcher {
                label: measurement.label.clone(),
                pattern: Regex::new(&label_pattern(&measurement.label, value))?,
                numeric,
            });
        }

        Ok(Self {
            selector_label,
            profiles,
            labels,
        })
    }

    /// Recognize entities in `text`, returned in text order.
    ///
    /// The selector entity carries the canonical profile name. Numeric values
    /// are emitted with a decimal point (`12,5` becomes `12.5`); words are
    /// emitted verbatim.
    pub fn recognize(&self, text: &str) -> Vec<Entity> {
        let text = normalize_whitespace(text);
        let mut found: Vec<(usize, Entity)> = Vec::new();

        for profile in &self.profiles {
            if let Some(m) = profile.pattern.find(&text) {
                found.push((m.start(), Entity::new(&profile.name, &self.selector_label)));
            }
        }

        for matcher in &self.labels {
            for caps in matcher.pattern.captures_iter(&text) {
                if let Some(value) = caps.name("value") {
                    let text = if matcher.numeric {
                        decimal_point(value.as_str())
                    } else {
                        value.as_str().to_string()
                    };
                    found.push((value.start(), Entity::new(text, &matcher.label)));
                }
            }
        }

        found.sort_by_key(|(pos, _)| *pos);
        let entities: Vec<Entity> = found.into_iter().map(|(_, e)| e).collect();
        debug!(count = entities.len(), "Pattern recognition complete");
        entities
    }
}
