//! User tide settings, the feature document, and its persisted copy
//!
//! Settings arrive as free text from numeric inputs; `,` and `.` are both
//! accepted as decimal separator and unparseable input falls back to a
//! default rather than failing. The feature document is the GeoJSON-like
//! collection shipped with the app or imported by the user, saved back to
//! a single JSON file together with the settings.

use crate::core::constants::{DEFAULT_DELTA_M, DEFAULT_SEA_LEVEL_M, DEFAULT_SUBMERGED_MAX_DISTANCE_M};
use crate::core::GeoFeature;
use crate::validation::data::numeric_property;
use crate::validation::error::{StoreError, ValidationError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

const BUNDLED_LANDMARKS: &str = include_str!("../../data/landmarks.geojson");

/// Parse a user-typed decimal, taking the longest numeric prefix.
///
/// `"4,5"` and `"4.5 m"` both read as 4.5; empty or non-numeric text is `None`.
pub fn parse_decimal_input(text: &str) -> Option<f64> {
    let normalized = text.trim().replace(',', ".");
    let mut ends: Vec<usize> = normalized.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
    ends.reverse();

    ends.into_iter()
        .filter_map(|end| normalized[..end].parse::<f64>().ok())
        .find(|v| v.is_finite())
}

/// Parse a setting, falling back when the text is not a number
pub fn parse_setting_or(text: &str, fallback: f64) -> f64 {
    match parse_decimal_input(text) {
        Some(value) => value,
        None => {
            log::warn!("could not parse setting {:?}, using {}", text, fallback);
            fallback
        }
    }
}

/// Tide height, calibration delta and submerged-marker distance limit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TideSettings {
    /// Current sea level height (m)
    pub sea_level: f64,
    /// Calibration delta added to landmark altitudes (m)
    pub delta: f64,
    /// Submerged landmarks farther than this are hidden (m)
    pub max_distance: f64,
}

impl Default for TideSettings {
    fn default() -> Self {
        Self {
            sea_level: DEFAULT_SEA_LEVEL_M,
            delta: DEFAULT_DELTA_M,
            max_distance: DEFAULT_SUBMERGED_MAX_DISTANCE_M,
        }
    }
}

impl TideSettings {
    pub fn new(sea_level: f64, delta: f64, max_distance: f64) -> Self {
        Self {
            sea_level,
            delta,
            max_distance,
        }
    }

    /// Build from raw text inputs; sea level and delta fall back to 0
    pub fn from_inputs(sea_level: &str, delta: &str, max_distance: &str) -> Self {
        Self {
            sea_level: parse_setting_or(sea_level, 0.0),
            delta: parse_setting_or(delta, 0.0),
            max_distance: parse_setting_or(max_distance, DEFAULT_SUBMERGED_MAX_DISTANCE_M),
        }
    }

    pub fn effective_sea_level(&self) -> f64 {
        self.sea_level + self.delta
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(numeric_property))
}

/// Geometry as found in the document; coordinates stay unvalidated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGeometry {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

/// Feature entry as found in the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeature {
    #[serde(rename = "type", default = "feature_tag")]
    pub kind: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: RawGeometry,
}

fn feature_tag() -> String {
    "Feature".to_string()
}

fn collection_tag() -> String {
    "FeatureCollection".to_string()
}

impl RawFeature {
    pub fn name(&self) -> Option<&str> {
        self.properties
            .get("nom")
            .or_else(|| self.properties.get("name"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Reference altitude: `alt1`, then `altitude`, then `hauteurAuDessusNiveauMer`
    pub fn reference_altitude(&self) -> Option<f64> {
        ["alt1", "altitude", "hauteurAuDessusNiveauMer"]
            .iter()
            .find_map(|key| self.properties.get(*key).and_then(numeric_property))
    }

    fn text_property(&self, key: &str) -> Option<String> {
        self.properties
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Feature collection plus reference and persisted settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDocument {
    #[serde(rename = "type", default = "collection_tag")]
    pub kind: String,
    pub features: Vec<RawFeature>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub delta_reference: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub max_distance_reference: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub sea_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
    /// Any other top-level keys, kept so a save round-trips them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeatureDocument {
    /// Parse a document, requiring a `features` array
    pub fn from_json_str(text: &str) -> Result<Self, StoreError> {
        let value: Value = serde_json::from_str(text).map_err(|e| StoreError::Parse {
            message: e.to_string(),
        })?;

        if !value.get("features").map_or(false, Value::is_array) {
            return Err(StoreError::MissingFeatures);
        }

        serde_json::from_value(value).map_err(|e| StoreError::Parse {
            message: e.to_string(),
        })
    }

    /// Landmarks in document order.
    ///
    /// Unnamed entries get a positional name; repeated names get a `#n` id
    /// suffix so each landmark keeps its own visibility history.
    pub fn to_features(&self) -> Vec<GeoFeature> {
        let mut seen: HashMap<String, usize> = HashMap::new();

        self.features
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                let name = match raw.name() {
                    Some(name) => name.to_string(),
                    None => {
                        log::debug!("{}", ValidationError::MissingName { index });
                        format!("Feature {}", index + 1)
                    }
                };

                let count = seen.entry(name.clone()).or_insert(0);
                *count += 1;
                let id = if *count == 1 {
                    name.clone()
                } else {
                    format!("{}#{}", name, count)
                };

                GeoFeature {
                    id,
                    name,
                    coordinates: raw.geometry.coordinates.clone(),
                    reference_altitude: raw.reference_altitude(),
                    feature_type: raw.text_property("featureType"),
                    description: raw.text_property("description"),
                }
            })
            .collect()
    }
}

/// Active feature collection and settings, backed by one JSON file
pub struct FeatureStore {
    defaults: FeatureDocument,
    raw_features: Vec<RawFeature>,
    features: Vec<GeoFeature>,
    settings: TideSettings,
}

impl FeatureStore {
    /// Store seeded with the bundled landmark set
    pub fn bundled() -> Result<Self, StoreError> {
        Ok(Self::from_document(FeatureDocument::from_json_str(BUNDLED_LANDMARKS)?))
    }

    pub fn from_document(document: FeatureDocument) -> Self {
        let features = document.to_features();
        Self {
            raw_features: document.features.clone(),
            features,
            settings: TideSettings::default(),
            defaults: document,
        }
    }

    pub fn features(&self) -> &[GeoFeature] {
        &self.features
    }

    pub fn settings(&self) -> TideSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: TideSettings) {
        self.settings = settings;
    }

    /// Merge a saved document over the defaults.
    ///
    /// Returns `Ok(false)` when no file exists yet.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<bool, StoreError> {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(StoreError::Io {
                    message: format!("failed to read '{}': {}", path.as_ref().display(), e),
                })
            }
        };

        let saved = FeatureDocument::from_json_str(&content)?;
        self.replace_features(saved.features.clone());
        if let Some(sea_level) = saved.sea_level {
            self.settings.sea_level = sea_level;
        }
        if let Some(delta) = saved.delta {
            self.settings.delta = delta;
        }
        if let Some(max_distance) = saved.max_distance {
            self.settings.max_distance = max_distance;
        }

        log::info!(
            "loaded {} features from {}",
            self.features.len(),
            path.as_ref().display()
        );
        Ok(true)
    }

    /// Write the defaults' metadata, current features and settings
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let document = FeatureDocument {
            features: self.raw_features.clone(),
            sea_level: Some(self.settings.sea_level),
            delta: Some(self.settings.delta),
            max_distance: Some(self.settings.max_distance),
            ..self.defaults.clone()
        };

        let content = serde_json::to_string(&document).map_err(|e| StoreError::Parse {
            message: e.to_string(),
        })?;
        fs::write(&path, content).map_err(|e| StoreError::Io {
            message: format!("failed to write '{}': {}", path.as_ref().display(), e),
        })?;

        log::info!("saved {} features to {}", self.features.len(), path.as_ref().display());
        Ok(())
    }

    /// Delete the saved file and return to the bundled features with zeroed tide settings
    pub fn reset<P: AsRef<Path>>(&mut self, path: P) -> Result<(), StoreError> {
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StoreError::Io {
                    message: format!("failed to delete '{}': {}", path.as_ref().display(), e),
                })
            }
        }

        self.replace_features(self.defaults.features.clone());
        self.settings = TideSettings {
            sea_level: 0.0,
            delta: 0.0,
            ..TideSettings::default()
        };
        Ok(())
    }

    /// Replace the collection with an imported document's features.
    ///
    /// `deltaReference` and `maxDistanceReference` override the settings when set.
    /// Returns the number of imported features.
    pub fn import_json(&mut self, text: &str) -> Result<usize, StoreError> {
        let imported = FeatureDocument::from_json_str(text)?;

        self.replace_features(imported.features);
        if let Some(delta) = imported.delta_reference.filter(|d| *d != 0.0) {
            self.settings.delta = delta;
        }
        if let Some(max_distance) = imported.max_distance_reference.filter(|d| *d != 0.0) {
            self.settings.max_distance = max_distance;
        }

        log::info!("imported {} features", self.features.len());
        Ok(self.features.len())
    }

    fn replace_features(&mut self, raw_features: Vec<RawFeature>) {
        self.raw_features = raw_features;
        self.features = FeatureDocument {
            features: self.raw_features.clone(),
            ..self.defaults.clone()
        }
        .to_features();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_decimal_input() {
        assert_eq!(parse_decimal_input("4.5"), Some(4.5));
        assert_eq!(parse_decimal_input(" 4,5 "), Some(4.5));
        assert_eq!(parse_decimal_input("12 m"), Some(12.0));
        assert_eq!(parse_decimal_input("-0,75"), Some(-0.75));
        assert_eq!(parse_decimal_input(""), None);
        assert_eq!(parse_decimal_input("abc"), None);
        assert_eq!(parse_decimal_input("inf"), None);
    }

    #[test]
    fn test_setting_fallback() {
        assert_eq!(parse_setting_or("oops", 0.0), 0.0);
        assert_eq!(parse_setting_or("", 7.0), 7.0);
        assert_eq!(parse_setting_or("14,5", 0.0), 14.5);

        let settings = TideSettings::from_inputs("8,0", "x", "");
        assert_eq!(settings.sea_level, 8.0);
        assert_eq!(settings.delta, 0.0);
        assert_eq!(settings.max_distance, 1000.0);
        assert_eq!(settings.effective_sea_level(), 8.0);
    }

    #[test]
    fn test_bundled_dataset() {
        let store = FeatureStore::bundled().unwrap();
        assert_eq!(store.features().len(), 8);

        let mengam = store.features().iter().find(|f| f.name == "Roche Mengam").unwrap();
        assert_eq!(mengam.reference_altitude, Some(6.2));
        assert_eq!(mengam.feature_type.as_deref(), Some("roche"));

        let charles = store.features().iter().find(|f| f.name == "Basse du Charles Martel").unwrap();
        assert_eq!(charles.reference_altitude, Some(1.8));
    }

    #[test]
    fn test_missing_features_rejected() {
        assert_eq!(
            FeatureDocument::from_json_str(r#"{ "type": "FeatureCollection" }"#),
            Err(StoreError::MissingFeatures)
        );
        assert_eq!(
            FeatureDocument::from_json_str(r#"{ "features": {} }"#),
            Err(StoreError::MissingFeatures)
        );
        assert!(matches!(
            FeatureDocument::from_json_str("not json"),
            Err(StoreError::Parse { .. })
        ));
    }

    #[test]
    fn test_duplicate_and_missing_names() {
        let doc = FeatureDocument::from_json_str(
            r#"{ "features": [
                { "properties": { "nom": "Roche" }, "geometry": { "coordinates": [-4.5, 48.3] } },
                { "properties": { "nom": "Roche" }, "geometry": { "coordinates": [-4.6, 48.3] } },
                { "properties": {}, "geometry": { "coordinates": [-4.7, 48.3] } }
            ] }"#,
        )
        .unwrap();

        let features = doc.to_features();
        assert_eq!(features[0].id, "Roche");
        assert_eq!(features[1].id, "Roche#2");
        assert_eq!(features[1].name, "Roche");
        assert_eq!(features[2].name, "Feature 3");
    }

    #[test]
    fn test_load_missing_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let mut store = FeatureStore::bundled().unwrap();
        assert!(!store.load(dir.path().join("absent.json")).unwrap());
        assert_eq!(store.features().len(), 8);
        assert_eq!(store.settings(), TideSettings::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("myGeoData.json");

        let mut store = FeatureStore::bundled().unwrap();
        store.set_settings(TideSettings::new(6.5, 3.0, 800.0));
        store.save(&path).unwrap();

        let mut reloaded = FeatureStore::bundled().unwrap();
        assert!(reloaded.load(&path).unwrap());
        assert_eq!(reloaded.settings(), TideSettings::new(6.5, 3.0, 800.0));
        let ids = |s: &FeatureStore| s.features().iter().map(|f| f.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&reloaded), ids(&store));
        assert_eq!(reloaded.features()[3].reference_altitude, Some(6.2));

        // Top-level metadata survives the round trip
        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["name"], "Entites remarquables - Iroise");
        assert_eq!(saved["seaLevel"], 6.5);
    }

    #[test]
    fn test_load_without_features_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, r#"{ "seaLevel": 3 }"#).unwrap();

        let mut store = FeatureStore::bundled().unwrap();
        assert_eq!(store.load(&path), Err(StoreError::MissingFeatures));
        assert_eq!(store.features().len(), 8);
    }

    #[test]
    fn test_import_replaces_features() {
        let mut store = FeatureStore::bundled().unwrap();
        let count = store
            .import_json(
                r#"{
                "type": "FeatureCollection",
                "deltaReference": "3,2",
                "maxDistanceReference": 1500,
                "features": [
                    { "type": "Feature",
                      "properties": { "nom": "Men Du", "featureType": "roche", "altitude": 4 },
                      "geometry": { "type": "Point", "coordinates": [-4.52, 48.35] } }
                ]
            }"#,
            )
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(store.features()[0].name, "Men Du");
        assert_eq!(store.settings().delta, 3.2);
        assert_eq!(store.settings().max_distance, 1500.0);
        assert_eq!(store.settings().sea_level, 8.0);
    }

    #[test]
    fn test_reset_restores_bundled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("myGeoData.json");

        let mut store = FeatureStore::bundled().unwrap();
        store
            .import_json(r#"{ "features": [ { "properties": { "nom": "X" }, "geometry": { "coordinates": [0, 0] } } ] }"#)
            .unwrap();
        store.save(&path).unwrap();

        store.reset(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(store.features().len(), 8);
        assert_eq!(store.settings().sea_level, 0.0);
        assert_eq!(store.settings().delta, 0.0);

        // Resetting twice is fine
        store.reset(&path).unwrap();
    }
}
