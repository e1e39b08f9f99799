//! Structural checks for profile catalogs.
//!
//! Catalog documents are checked against schema/profile_catalog.schema.json
//! before deserializing, so a misplaced key is reported with its location
//! rather than as an opaque serde error.

use serde_json::Value;
use std::sync::OnceLock;

use super::parser::ProfileError;

const CATALOG_SCHEMA: &str = include_str!("../../../../schema/profile_catalog.schema.json");

fn compile_catalog_schema() -> Result<jsonschema::Validator, String> {
    let schema: Value = serde_json::from_str(CATALOG_SCHEMA)
        .map_err(|e| format!("catalog schema is not JSON: {}", e))?;
    jsonschema::draft7::new(&schema).map_err(|e| format!("catalog schema does not compile: {}", e))
}

/// Check a catalog document, collecting every violation.
pub(super) fn check_catalog(document: &Value) -> Result<(), ProfileError> {
    static COMPILED: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

    let schema = COMPILED
        .get_or_init(compile_catalog_schema)
        .as_ref()
        .map_err(|e| ProfileError::SchemaError(vec![e.clone()]))?;

    let violations: Vec<String> = schema
        .iter_errors(document)
        .map(|e| {
            let at = e.instance_path.to_string();
            if at.is_empty() {
                format!("catalog: {}", e)
            } else {
                format!("{}: {}", at, e)
            }
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ProfileError::SchemaError(violations))
    }
}
