//! # fete-core
//!
//! Deterministic validation of fetal ultrasound scan report measurements.
//!
//! This crate answers one question for a scan report whose text has already
//! been recognized: do the measurements lie within the reference values for
//! the report's trimester, and if not, which ones are off?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same extracted data always produces the same outcome
//! 2. **Total**: Validation never panics; bad values become issues
//! 3. **Profile-driven**: Only labels the selected profile expects are checked
//! 4. **Parallel-safe**: Profile stores are immutable and shareable
//!
//! ## Example
//!
//! ```rust
//! use fete_core::{validate, ExtractedData, Outcome};
//!
//! let data: ExtractedData = [
//!     ("TRIMESTER", "First Trimester Scan Report"),
//!     ("FETAL HEART BEAT", "200"),
//! ]
//! .into_iter()
//! .collect();
//!
//! match validate(&data) {
//!     Outcome::Assessed { verdict } => {
//!         for issue in verdict.issues() {
//!             println!("{}", issue);
//!         }
//!     }
//!     Outcome::UnknownProfile { .. } => println!("Unknown trimester"),
//! }
//! ```

pub mod extraction;
pub mod profile;
pub mod reading;
pub mod recognition;
pub mod report;
pub mod types;
pub mod validator;

// Re-export main types at crate root
pub use extraction::{group_by_label, DuplicatePolicy, Entity, ExtractedData};
pub use profile::{
    Measurement, ProfileCatalog, ProfileError, ReferenceProfile, ReferenceProfileStore,
    DEFAULT_SELECTOR_LABEL, FIRST_TRIMESTER, SECOND_THIRD_TRIMESTER,
};
pub use reading::Reading;
pub use recognition::PatternRecognizer;
pub use report::{summarize, Assessment};
pub use types::{ExpectedValue, Issue, IssueKind, Outcome, ValidationVerdict};
pub use validator::Validator;

/// Validate extracted data against the built-in reference profiles.
///
/// This is the main entry point for measurement validation.
///
/// # Returns
///
/// - `Outcome::Assessed` with a verdict whose issues follow profile order
/// - `Outcome::UnknownProfile` when the `TRIMESTER` value is absent or
///   names no built-in profile
pub fn validate(extracted: &ExtractedData) -> Outcome {
    Validator::builtin().validate(extracted)
}

/// Validate extracted data against a custom profile store.
pub fn validate_with_store(extracted: &ExtractedData, store: &ReferenceProfileStore) -> Outcome {
    Validator::new(store).validate(extracted)
}

/// Validate recognized `(text, label)` entities and keep them for display.
pub fn assess(entities: Vec<Entity>) -> Assessment {
    Assessment::from_entities(&Validator::builtin(), entities)
}
