//! The boundary between entity recognition and validation.
//!
//! Recognizers emit `(text, label)` pairs. Validation needs one value per
//! label, so duplicates are resolved here with an explicit policy rather
//! than by round-tripping through a value-keyed map.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// One recognized text span and its semantic label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Entity {
    /// The recognized text, verbatim
    pub text: String,

    /// The assigned label (e.g., "FETAL HEART BEAT")
    pub label: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Which value to keep when a label is recognized more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The last occurrence in recognition order wins
    #[default]
    LastWins,

    /// The first occurrence in recognition order wins
    FirstWins,
}

/// Extracted measurement values keyed by label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedData {
    values: BTreeMap<String, String>,
}

impl ExtractedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from recognized entities, last occurrence wins.
    pub fn from_entities<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Self {
        Self::from_entities_with_policy(entities, DuplicatePolicy::LastWins)
    }

    /// Build from recognized entities with an explicit duplicate policy.
    ///
    /// A label seen again with a different value is logged, since reports
    /// are expected to state each measurement once.
    pub fn from_entities_with_policy<'a>(
        entities: impl IntoIterator<Item = &'a Entity>,
        policy: DuplicatePolicy,
    ) -> Self {
        let mut values: BTreeMap<String, String> = BTreeMap::new();

        for entity in entities {
            match values.entry(entity.label.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(entity.text.clone());
                }
                Entry::Occupied(mut slot) => {
                    if slot.get() != &entity.text {
                        warn!(
                            label = %entity.label,
                            kept = ?policy,
                            previous = %slot.get(),
                            current = %entity.text,
                            "Label recognized with conflicting values"
                        );
                    }
                    if policy == DuplicatePolicy::LastWins {
                        slot.insert(entity.text.clone());
                    }
                }
            }
        }

        Self { values }
    }

    /// Build from the legacy value→label map by inverting it.
    ///
    /// Lossy: two labels that share the same recognized text already
    /// collided as keys before this call, so only one of them survives.
    /// Prefer [`ExtractedData::from_entities`].
    pub fn from_value_keyed(map: &HashMap<String, String>) -> Self {
        let mut pairs: Vec<(&String, &String)> = map.iter().collect();
        pairs.sort();
        let values = pairs
            .into_iter()
            .map(|(value, label)| (label.clone(), value.clone()))
            .collect();
        Self { values }
    }

    /// Set the value for a label, replacing any previous value.
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.values.insert(label.into(), value.into());
    }

    /// The value for a label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.values.get(label).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.values.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Label/value pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtractedData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Group recognized values by label, keeping every occurrence in order.
pub fn group_by_label<'a>(
    entities: impl IntoIterator<Item = &'a Entity>,
) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entity in entities {
        groups
            .entry(entity.label.clone())
            .or_default()
            .push(entity.text.clone());
    }
    groups
}
