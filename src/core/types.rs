//! Core data types shared by the AR pipeline

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Geographic point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Landmark loaded from a feature collection.
///
/// `coordinates` keeps the raw GeoJSON `[lon, lat]` array; it is validated
/// each frame so one malformed entry never aborts the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    /// Stable key for hysteresis tracking, unique within a collection
    pub id: String,
    pub name: String,
    pub coordinates: Value,
    /// Height above nominal sea level (m)
    pub reference_altitude: Option<f64>,
    pub feature_type: Option<String>,
    pub description: Option<String>,
}

impl GeoFeature {
    /// Build a feature from a well-formed position. The name doubles as id.
    pub fn new(name: &str, lat: f64, lon: f64) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
            coordinates: Value::from(vec![lon, lat]),
            reference_altitude: None,
            feature_type: None,
            description: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.reference_altitude = Some(altitude);
        self
    }

    pub fn with_feature_type(mut self, feature_type: &str) -> Self {
        self.feature_type = Some(feature_type.to_string());
        self
    }
}

/// Location fix from the platform location stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub point: GeoPoint,
    /// Horizontal accuracy radius (m), if reported
    pub accuracy_m: Option<f64>,
    /// Platform timestamp (ms since epoch)
    pub timestamp_ms: u64,
}

impl LocationFix {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            point: GeoPoint::new(lat, lon),
            accuracy_m: None,
            timestamp_ms: 0,
        }
    }
}

/// Size of the rendering surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self::new(390.0, 844.0)
    }
}
