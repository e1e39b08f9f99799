//! The immutable catalog of reference profiles.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use super::parser::{Measurement, ProfileCatalog, ProfileError, ReferenceProfile};

/// Label whose extracted value names the profile to apply.
pub const DEFAULT_SELECTOR_LABEL: &str = "TRIMESTER";

/// Name of the built-in first trimester profile.
pub const FIRST_TRIMESTER: &str = "First Trimester Scan Report";

/// Name of the built-in second/third trimester profile.
pub const SECOND_THIRD_TRIMESTER: &str = "2/3 Trimester Scan Report";

static BUILTIN: OnceLock<ReferenceProfileStore> = OnceLock::new();

/// Read-only mapping from profile name to reference profile.
///
/// Built once and never mutated, so it can be shared across threads freely.
#[derive(Debug, Clone)]
pub struct ReferenceProfileStore {
    selector_label: String,
    profiles: Vec<ReferenceProfile>,
    index: HashMap<String, usize>,
}

impl ReferenceProfileStore {
    /// Build a store from validated profiles.
    ///
    /// Profile names must be unique, and every profile must carry the
    /// selector entry for `selector_label`.
    pub fn new(
        selector_label: impl Into<String>,
        profiles: Vec<ReferenceProfile>,
    ) -> Result<Self, ProfileError> {
        let selector_label = selector_label.into();
        let mut index = HashMap::with_capacity(profiles.len());

        for (i, profile) in profiles.iter().enumerate() {
            if index.insert(profile.name().to_string(), i).is_some() {
                return Err(ProfileError::DuplicateProfile(profile.name().to_string()));
            }

            let selects_itself = matches!(
                profile.expected(&selector_label),
                Some(crate::types::ExpectedValue::Category(name)) if name == profile.name()
            );
            if !selects_itself {
                return Err(ProfileError::ValidationError(format!(
                    "Profile {} has no {} entry naming itself",
                    profile.name(),
                    selector_label
                )));
            }
        }

        Ok(Self {
            selector_label,
            profiles,
            index,
        })
    }

    /// Build a store from a parsed catalog.
    pub fn from_catalog(catalog: ProfileCatalog) -> Result<Self, ProfileError> {
        let (selector, profiles) = catalog.into_profiles()?;
        Self::new(selector, profiles)
    }

    /// Load a store from a YAML or JSON catalog file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        Self::from_catalog(ProfileCatalog::from_file(path)?)
    }

    /// The built-in store with the first and second/third trimester profiles.
    pub fn builtin() -> &'static ReferenceProfileStore {
        BUILTIN.get_or_init(builtin_store)
    }

    /// Resolve a profile by name. `None` for names outside the catalog.
    pub fn get_profile(&self, name: &str) -> Option<&ReferenceProfile> {
        self.index.get(name).map(|&i| &self.profiles[i])
    }

    /// Label whose extracted value selects the profile.
    pub fn selector_label(&self) -> &str {
        &self.selector_label
    }

    /// Profiles in catalog order.
    pub fn profiles(&self) -> impl Iterator<Item = &ReferenceProfile> {
        self.profiles.iter()
    }

    /// Profile names in catalog order.
    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name()).collect()
    }
}

fn builtin_profiles() -> Vec<(&'static str, Vec<Measurement>)> {
    vec![
        (
            FIRST_TRIMESTER,
            vec![
                Measurement::category("LIQUOR", "Normal"),
                Measurement::category("CARDIAC ACTIVITY", "present"),
                Measurement::range("FETAL HEART BEAT", 110.0, 160.0, "bpm"),
                Measurement::range("CROWN LUMP LENGTH", 43.0, 60.0, "mm"),
                Measurement::range("BIPARIETAL DIAMETER", 17.0, 42.0, "mm"),
                Measurement::range("HEAD CIRCUMFERENCE", 60.0, 80.0, "mm"),
                Measurement::range("ABDOMINAL CIRCUMFERENCE", 50.0, 60.0, "mm"),
            ],
        ),
        (
            SECOND_THIRD_TRIMESTER,
            vec![
                Measurement::category("LIQUOR", "Normal"),
                Measurement::category("CARDIAC ACTIVITY", "present"),
                Measurement::range("FETAL HEART BEAT", 120.0, 180.0, "bpm"),
                Measurement::range("CROWN LUMP LENGTH", 115.0, 400.0, "mm"),
                Measurement::range("BIPARIETAL DIAMETER", 45.0, 88.0, "mm"),
                Measurement::range("HEAD CIRCUMFERENCE", 160.0, 240.0, "mm"),
                Measurement::range("ABDOMINAL CIRCUMFERENCE", 110.0, 190.0, "mm"),
                Measurement::range("TRANSVERSE CEREBELLAR DIAMETER", 15.0, 25.0, "mm"),
            ],
        ),
    ]
}

fn builtin_store() -> ReferenceProfileStore {
    let mut profiles = Vec::new();
    let mut index = HashMap::new();

    for (name, measurements) in builtin_profiles() {
        // Unchecked; test_builtin_profiles_pass_validation covers the table.
        let mut all = vec![Measurement::category(DEFAULT_SELECTOR_LABEL, name)];
        all.extend(measurements);
        index.insert(name.to_string(), profiles.len());
        profiles.push(ReferenceProfile::from_parts(name.to_string(), all));
    }

    ReferenceProfileStore {
        selector_label: DEFAULT_SELECTOR_LABEL.to_string(),
        profiles,
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExpectedValue;

    #[test]
    fn test_builtin_profiles_present() {
        let store = ReferenceProfileStore::builtin();
        assert_eq!(store.names(), vec![FIRST_TRIMESTER, SECOND_THIRD_TRIMESTER]);
        assert_eq!(store.selector_label(), "TRIMESTER");
    }

    #[test]
    fn test_builtin_profiles_pass_validation() {
        let store = ReferenceProfileStore::builtin();
        let profiles: Vec<_> = store
            .profiles()
            .map(|p| ReferenceProfile::new(p.name(), "TRIMESTER", p.measurements().to_vec()))
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(ReferenceProfileStore::new("TRIMESTER", profiles).is_ok());
    }

    #[test]
    fn test_every_profile_selects_itself() {
        let store = ReferenceProfileStore::builtin();
        for profile in store.profiles() {
            assert_eq!(
                profile.expected("TRIMESTER"),
                Some(&ExpectedValue::category(profile.name()))
            );
            assert_eq!(store.get_profile(profile.name()), Some(profile));
        }
    }

    #[test]
    fn test_unknown_profile_not_found() {
        let store = ReferenceProfileStore::builtin();
        assert!(store.get_profile("bogus").is_none());
        assert!(store.get_profile("first trimester scan report").is_none());
    }

    #[test]
    fn test_later_profile_adds_cerebellar_diameter() {
        let store = ReferenceProfileStore::builtin();
        let first = store.get_profile(FIRST_TRIMESTER).unwrap();
        let later = store.get_profile(SECOND_THIRD_TRIMESTER).unwrap();

        assert!(first.expected("TRANSVERSE CEREBELLAR DIAMETER").is_none());
        assert_eq!(
            later.expected("TRANSVERSE CEREBELLAR DIAMETER"),
            Some(&ExpectedValue::range(15.0, 25.0))
        );
        assert_eq!(later.measurements().len(), first.measurements().len() + 1);
    }

    #[test]
    fn test_duplicate_profile_rejected() {
        let p = ReferenceProfile::new("Early Scan", "TRIMESTER", vec![]).unwrap();
        let result = ReferenceProfileStore::new("TRIMESTER", vec![p.clone(), p]);
        assert!(matches!(result, Err(ProfileError::DuplicateProfile(_))));
    }

    #[test]
    fn test_selector_label_mismatch_rejected() {
        let p = ReferenceProfile::new("Early Scan", "STAGE", vec![]).unwrap();
        let result = ReferenceProfileStore::new("TRIMESTER", vec![p]);
        assert!(matches!(result, Err(ProfileError::ValidationError(_))));
    }

    #[test]
    fn test_store_from_catalog() {
        let catalog = ProfileCatalog::from_yaml(
            r#"
selector: STAGE
profiles:
  - name: "Anomaly Scan"
    measurements:
      - { label: "FETAL HEART BEAT", range: [120, 180], unit: bpm }
"#,
        )
        .unwrap();
        let store = ReferenceProfileStore::from_catalog(catalog).unwrap();
        assert_eq!(store.selector_label(), "STAGE");
        assert!(store.get_profile("Anomaly Scan").is_some());
    }

    #[test]
    fn test_shipped_catalog_matches_builtin() {
        let catalog = ProfileCatalog::from_yaml(include_str!(
            "../../../../catalogs/trimester_profiles.yaml"
        ))
        .unwrap();
        let store = ReferenceProfileStore::from_catalog(catalog).unwrap();
        let builtin = ReferenceProfileStore::builtin();

        assert_eq!(store.names(), builtin.names());
        for profile in builtin.profiles() {
            assert_eq!(store.get_profile(profile.name()), Some(profile));
        }
    }

    #[test]
    fn test_from_file_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = "selector: STAGE\nprofiles:\n  - name: Anomaly Scan\n    measurements:\n      - { label: LIQUOR, category: Normal }\n";
        let json = r#"{"selector": "STAGE", "profiles": [{"name": "Anomaly Scan", "measurements": [{"label": "LIQUOR", "category": "Normal"}]}]}"#;

        let yaml_path = dir.path().join("catalog.yaml");
        std::fs::write(&yaml_path, yaml).unwrap();
        let json_path = dir.path().join("catalog.json");
        std::fs::write(&json_path, json).unwrap();

        for path in [&yaml_path, &json_path] {
            let store = ReferenceProfileStore::from_file(path).unwrap();
            assert_eq!(store.selector_label(), "STAGE");
            let profile = store.get_profile("Anomaly Scan").unwrap();
            assert_eq!(
                profile.expected("LIQUOR"),
                Some(&ExpectedValue::category("Normal"))
            );
        }

        // YAML text under a .json name goes to the JSON parser
        let misnamed = dir.path().join("yaml_in_disguise.json");
        std::fs::write(&misnamed, yaml).unwrap();
        assert!(matches!(
            ReferenceProfileStore::from_file(&misnamed),
            Err(ProfileError::JsonError(_))
        ));

        assert!(matches!(
            ReferenceProfileStore::from_file(dir.path().join("absent.yaml")),
            Err(ProfileError::IoError(_))
        ));
    }
}
