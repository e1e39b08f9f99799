//! Validator: evaluates extracted data against the selected profile.
//!
//! The evaluation rules are fixed:
//! 1. The selector label's value names the profile. Absent or unknown →
//!    `UnknownProfile`, and nothing else is evaluated.
//! 2. Every measurement of the profile is checked, in profile order.
//!    Problems are recorded and evaluation continues.
//! 3. Labels the profile does not mention are ignored.
//! 4. The verdict is healthy iff no issues were recorded.

use tracing::{debug, info, warn};

use crate::extraction::ExtractedData;
use crate::profile::{Measurement, ReferenceProfile, ReferenceProfileStore};
use crate::reading::Reading;
use crate::types::{ExpectedValue, Issue, Outcome, ValidationVerdict};

/// Validates extracted data against a profile store.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'s> {
    store: &'s ReferenceProfileStore,
}

impl Validator<'static> {
    /// A validator over the built-in profiles.
    pub fn builtin() -> Self {
        Self::new(ReferenceProfileStore::builtin())
    }
}

impl Default for Validator<'static> {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'s> Validator<'s> {
    pub fn new(store: &'s ReferenceProfileStore) -> Self {
        Self { store }
    }

    /// The store profiles are resolved from.
    pub fn store(&self) -> &'s ReferenceProfileStore {
        self.store
    }

    /// Validate extracted data.
    ///
    /// Never panics and never fails: every per-label problem becomes an
    /// issue, and an unselectable profile becomes `Outcome::UnknownProfile`.
    pub fn validate(&self, extracted: &ExtractedData) -> Outcome {
        let selector_label = self.store.selector_label();
        let selector = extracted.get(selector_label);

        let profile = match selector.and_then(|name| self.store.get_profile(name)) {
            Some(profile) => profile,
            None => {
                warn!(
                    selector_label,
                    selector = ?selector,
                    "No reference profile matches the extracted data"
                );
                return Outcome::UnknownProfile {
                    selector: selector.map(str::to_string),
                };
            }
        };

        let verdict = self.evaluate_profile(profile, extracted);
        info!(
            profile = verdict.profile(),
            healthy = verdict.is_healthy(),
            issues = verdict.issues().len(),
            "Validation complete"
        );

        Outcome::Assessed { verdict }
    }

    /// Evaluate every measurement of `profile`, in order.
    pub fn evaluate_profile(
        &self,
        profile: &ReferenceProfile,
        extracted: &ExtractedData,
    ) -> ValidationVerdict {
        let issues: Vec<Issue> = profile
            .measurements()
            .iter()
            .filter_map(|m| evaluate_measurement(m, extracted.get(&m.label)))
            .inspect(|issue| debug!(label = %issue.label, message = %issue.message, "Issue recorded"))
            .collect();

        ValidationVerdict::new(profile.name(), issues)
    }
}

/// Check one measurement. `None` means it is satisfied.
pub fn evaluate_measurement(measurement: &Measurement, raw: Option<&str>) -> Option<Issue> {
    let label = measurement.label.as_str();

    let Some(raw) = raw else {
        return Some(Issue::missing(label));
    };

    match &measurement.expected {
        ExpectedValue::Range(min, max) => match Reading::parse(raw) {
            Reading::Numeric(value) => {
                if *min <= value && value <= *max {
                    None
                } else {
                    Some(Issue::out_of_range(label, value, *min, *max))
                }
            }
            Reading::Text(text) => Some(Issue::unparsable(label, text, *min, *max)),
        },
        ExpectedValue::Category(expected) => {
            if category_matches(raw, expected) {
                None
            } else {
                Some(Issue::category_mismatch(label, raw, expected.as_str()))
            }
        }
    }
}

/// Exact string equality, or numeric equality when both sides are numbers.
fn category_matches(raw: &str, expected: &str) -> bool {
    if raw == expected {
        return true;
    }

    match (Reading::parse(raw), Reading::parse(expected)) {
        (Reading::Numeric(a), Reading::Numeric(b)) => a == b,
        _ => false,
    }
}
