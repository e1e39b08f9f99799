//! Profile catalog parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::check_catalog;
use super::store::DEFAULT_SELECTOR_LABEL;
use crate::types::ExpectedValue;

/// Errors that can occur when loading reference profiles.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Failed to read profile catalog: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Profile catalog does not match schema: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Profile validation failed: {0}")]
    ValidationError(String),

    #[error("Duplicate profile name: {0}")]
    DuplicateProfile(String),
}

/// A single expected measurement within a profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    /// Semantic label assigned by entity recognition (e.g., "FETAL HEART BEAT")
    pub label: String,

    /// What the extracted value must satisfy
    #[serde(flatten)]
    pub expected: ExpectedValue,

    /// Unit of measure, for display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Measurement {
    /// Create a range measurement with a unit.
    pub fn range(label: impl Into<String>, min: f64, max: f64, unit: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            expected: ExpectedValue::range(min, max),
            unit: Some(unit.into()),
        }
    }

    /// Create a category measurement.
    pub fn category(label: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            expected: ExpectedValue::category(expected),
            unit: None,
        }
    }
}

/// An ordered set of expected measurements for one scan report stage.
///
/// Always contains a selector entry whose category equals the profile's own
/// name, so a profile can be identified from within extracted data.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReferenceProfile {
    name: String,
    measurements: Vec<Measurement>,
}

impl ReferenceProfile {
    /// Build a profile, inserting the selector entry first when absent.
    ///
    /// Fails on duplicate labels, inverted ranges, or a selector entry that
    /// names a different profile.
    pub fn new(
        name: impl Into<String>,
        selector_label: &str,
        measurements: Vec<Measurement>,
    ) -> Result<Self, ProfileError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProfileError::ValidationError(
                "Profile name must not be empty".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for m in &measurements {
            if !seen.insert(m.label.as_str()) {
                return Err(ProfileError::ValidationError(format!(
                    "Duplicate label {} in profile {}",
                    m.label, name
                )));
            }

            match &m.expected {
                ExpectedValue::Range(min, max) => {
                    if !(min.is_finite() && max.is_finite()) || min > max {
                        return Err(ProfileError::ValidationError(format!(
                            "Invalid range [{}, {}] for {} in profile {}",
                            min, max, m.label, name
                        )));
                    }
                }
                ExpectedValue::Category(_) => {}
            }

            if m.label == selector_label && m.expected != ExpectedValue::Category(name.clone()) {
                return Err(ProfileError::ValidationError(format!(
                    "Selector entry {} in profile {} must be the profile name",
                    selector_label, name
                )));
            }
        }

        let has_selector = seen.contains(selector_label);
        let mut measurements = measurements;
        if !has_selector {
            measurements.insert(0, Measurement::category(selector_label, name.clone()));
        }

        Ok(Self { name, measurements })
    }

    /// Assemble a profile from a trusted table without checks.
    pub(super) fn from_parts(name: String, measurements: Vec<Measurement>) -> Self {
        Self { name, measurements }
    }

    /// The profile's lookup key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Measurements in evaluation order.
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Look up the expectation for a label.
    pub fn expected(&self, label: &str) -> Option<&ExpectedValue> {
        self.measurements
            .iter()
            .find(|m| m.label == label)
            .map(|m| &m.expected)
    }
}

/// A profile as written in a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDefinition {
    /// Profile name, also the selector value
    pub name: String,

    /// Expected measurements in evaluation order
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

fn default_selector() -> String {
    DEFAULT_SELECTOR_LABEL.to_string()
}

/// A profile catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCatalog {
    /// Label whose extracted value selects the profile
    #[serde(default = "default_selector")]
    pub selector: String,

    /// Profiles in catalog order
    pub profiles: Vec<ProfileDefinition>,
}

impl ProfileCatalog {
    /// Parse a catalog from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ProfileError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a catalog from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a catalog file, choosing the format by extension.
    ///
    /// `.json` files are read as JSON; anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, ProfileError> {
        check_catalog(&value)?;
        let catalog: ProfileCatalog = serde_json::from_value(value)?;
        Ok(catalog)
    }

    /// Build validated profiles from the definitions.
    pub fn into_profiles(self) -> Result<(String, Vec<ReferenceProfile>), ProfileError> {
        let selector = self.selector;
        let profiles = self
            .profiles
            .into_iter()
            .map(|def| ReferenceProfile::new(def.name, &selector, def.measurements))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((selector, profiles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
selector: TRIMESTER
profiles:
  - name: "Early Scan"
    measurements:
      - label: LIQUOR
        category: Normal
      - label: FETAL HEART BEAT
        range: [110, 160]
        unit: bpm
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = ProfileCatalog::from_yaml(CATALOG).unwrap();
        assert_eq!(catalog.selector, "TRIMESTER");
        assert_eq!(catalog.profiles.len(), 1);

        let fhb = &catalog.profiles[0].measurements[1];
        assert_eq!(fhb.expected, ExpectedValue::range(110.0, 160.0));
        assert_eq!(fhb.unit.as_deref(), Some("bpm"));
    }

    #[test]
    fn test_selector_entry_inserted_first() {
        let (_, profiles) = ProfileCatalog::from_yaml(CATALOG)
            .unwrap()
            .into_profiles()
            .unwrap();

        let first = &profiles[0].measurements()[0];
        assert_eq!(first.label, "TRIMESTER");
        assert_eq!(first.expected, ExpectedValue::category("Early Scan"));
        assert_eq!(profiles[0].measurements().len(), 3);
    }

    #[test]
    fn test_selector_entry_must_match_name() {
        let result = ReferenceProfile::new(
            "Early Scan",
            "TRIMESTER",
            vec![Measurement::category("TRIMESTER", "Late Scan")],
        );
        assert!(matches!(result, Err(ProfileError::ValidationError(_))));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let result = ReferenceProfile::new(
            "Early Scan",
            "TRIMESTER",
            vec![Measurement::range("FETAL HEART BEAT", 160.0, 110.0, "bpm")],
        );
        assert!(matches!(result, Err(ProfileError::ValidationError(_))));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let result = ReferenceProfile::new(
            "Early Scan",
            "TRIMESTER",
            vec![
                Measurement::category("LIQUOR", "Normal"),
                Measurement::category("LIQUOR", "Reduced"),
            ],
        );
        assert!(matches!(result, Err(ProfileError::ValidationError(_))));
    }

    #[test]
    fn test_json_catalog_defaults_selector() {
        let json = r#"{"profiles": [{"name": "Early Scan", "measurements": []}]}"#;
        let catalog = ProfileCatalog::from_json(json).unwrap();
        assert_eq!(catalog.selector, DEFAULT_SELECTOR_LABEL);
    }

    #[test]
    fn test_schema_violation_reported() {
        let yaml = r#"
profiles:
  - name: "Early Scan"
    measurements:
      - label: LIQUOR
"#;
        let result = ProfileCatalog::from_yaml(yaml);
        assert!(matches!(result, Err(ProfileError::SchemaError(_))));
    }
}
