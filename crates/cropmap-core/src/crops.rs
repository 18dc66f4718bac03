//! Crop catalog configuration.
//!
//! The catalog is a YAML file listing the crops the deployment knows about,
//! each with an optional threshold set and an optional symbol override.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::thresholds::ThresholdSet;
use crate::ConfigError;

/// Reduce a crop or symbol label to its canonical asset identifier:
/// lowercase, spaces to underscores.
#[must_use]
pub fn canonical_symbol_id(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropConfig {
    pub name: String,
    pub thresholds: Option<ThresholdSet>,
    /// Symbol label override; defaults to the crop name.
    pub symbol: Option<String>,
    pub notes: Option<String>,
}

impl CropConfig {
    /// Canonical identifier of the symbol asset this crop renders with.
    #[must_use]
    pub fn symbol_id(&self) -> String {
        canonical_symbol_id(self.symbol.as_deref().unwrap_or(&self.name))
    }
}

#[derive(Debug, Deserialize)]
pub struct CropsFile {
    pub crops: Vec<CropConfig>,
}

/// Load and validate the crop catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_crops(path: &Path) -> Result<CropsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let crops_file: CropsFile = serde_yaml::from_str(&content).map_err(ConfigError::CatalogParse)?;

    validate_crops(&crops_file)?;

    Ok(crops_file)
}

fn validate_crops(crops_file: &CropsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for crop in &crops_file.crops {
        if crop.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "crop name must be non-empty".to_string(),
            ));
        }

        let lower_name = crop.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate crop name: '{}'",
                crop.name
            )));
        }

        if let Some(thresholds) = &crop.thresholds {
            if !thresholds.is_valid() {
                return Err(ConfigError::Validation(format!(
                    "crop '{}' has non-finite threshold values",
                    crop.name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_crop(name: &str) -> CropConfig {
        CropConfig {
            name: name.to_string(),
            thresholds: Some(ThresholdSet {
                poor: 6.0,
                average: 10.0,
                good: 14.0,
                excellent: 18.0,
            }),
            symbol: None,
            notes: None,
        }
    }

    #[test]
    fn canonical_id_lowercases_and_underscores() {
        assert_eq!(canonical_symbol_id("Winter Wheat"), "winter_wheat");
        assert_eq!(canonical_symbol_id("apple"), "apple");
        assert_eq!(canonical_symbol_id("  Sugar Beet "), "sugar_beet");
    }

    #[test]
    fn symbol_id_defaults_to_crop_name() {
        assert_eq!(make_crop("Winter Wheat").symbol_id(), "winter_wheat");
    }

    #[test]
    fn symbol_id_prefers_override() {
        let mut crop = make_crop("Winter Wheat");
        crop.symbol = Some("Wheat".to_string());
        assert_eq!(crop.symbol_id(), "wheat");
    }

    #[test]
    fn validate_rejects_empty_name() {
        let crops_file = CropsFile {
            crops: vec![make_crop("  ")],
        };
        let err = validate_crops(&crops_file).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_duplicate_name_case_insensitive() {
        let crops_file = CropsFile {
            crops: vec![make_crop("Apple"), make_crop("apple")],
        };
        let err = validate_crops(&crops_file).unwrap_err();
        assert!(err.to_string().contains("duplicate crop name"));
    }

    #[test]
    fn validate_rejects_non_finite_thresholds() {
        let mut crop = make_crop("apple");
        crop.thresholds = Some(ThresholdSet {
            poor: 6.0,
            average: f64::NAN,
            good: 14.0,
            excellent: 18.0,
        });
        let crops_file = CropsFile { crops: vec![crop] };
        let err = validate_crops(&crops_file).unwrap_err();
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn validate_accepts_crop_without_thresholds() {
        let mut crop = make_crop("heirloom tomato");
        crop.thresholds = None;
        let crops_file = CropsFile { crops: vec![crop] };
        assert!(validate_crops(&crops_file).is_ok());
    }

    #[test]
    fn parse_catalog_yaml() {
        let yaml = "\
crops:
  - name: apple
    thresholds:
      poor: 6.0
      average: 10.0
      good: 14.0
      excellent: 18.0
  - name: Winter Wheat
    symbol: wheat
";
        let crops_file: CropsFile = serde_yaml::from_str(yaml).unwrap();
        assert!(validate_crops(&crops_file).is_ok());
        assert_eq!(crops_file.crops.len(), 2);
        assert_eq!(crops_file.crops[1].symbol_id(), "wheat");
        assert!(crops_file.crops[1].thresholds.is_none());
    }
}
