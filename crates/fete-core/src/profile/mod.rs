//! Reference profiles and the profile store.
//!
//! A reference profile is the set of expected measurements for one scan
//! report stage. Catalogs of profiles are structured data validated against
//! JSON Schema before use; the built-in catalog is fixed at compile time.

mod parser;
mod schema;
mod store;

pub use parser::{Measurement, ProfileCatalog, ProfileDefinition, ProfileError, ReferenceProfile};
pub use store::{
    ReferenceProfileStore, DEFAULT_SELECTOR_LABEL, FIRST_TRIMESTER, SECOND_THIRD_TRIMESTER,
};
