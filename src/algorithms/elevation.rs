//! Submersion check against an effective sea level
//!
//! A landmark is above water when `(altitude + delta) - sea_level >= 0`.
//! The overlay and the water-level view both go through `compute_visibility`
//! with the same settings. Unknown altitude is never visible.

use crate::core::GeoFeature;
use serde::{Deserialize, Serialize};

/// Result of the submersion check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Visibility {
    pub is_visible: bool,
    /// Height above the water line (m); `None` when the altitude is unknown
    pub visibility_height: Option<f64>,
}

impl Visibility {
    pub const UNKNOWN: Visibility = Visibility {
        is_visible: false,
        visibility_height: None,
    };

    /// `Some(true)` above water, `Some(false)` submerged, `None` unknown
    pub fn above_water(&self) -> Option<bool> {
        self.visibility_height.map(|_| self.is_visible)
    }
}

/// Decide whether a landmark clears the water.
///
/// Missing or non-finite altitude is a defined degraded case, not an error.
pub fn compute_visibility(reference_altitude: Option<f64>, sea_level: f64, delta: f64) -> Visibility {
    match reference_altitude {
        Some(alt) if alt.is_finite() => {
            let visibility_height = (alt + delta) - sea_level;
            Visibility {
                is_visible: visibility_height >= 0.0,
                visibility_height: Some(visibility_height),
            }
        }
        _ => Visibility::UNKNOWN,
    }
}

/// Tide height plus calibration delta, recomputed on demand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveSeaLevel {
    pub sea_level: f64,
    pub delta: f64,
}

impl EffectiveSeaLevel {
    pub fn new(sea_level: f64, delta: f64) -> Self {
        Self { sea_level, delta }
    }

    pub fn value(&self) -> f64 {
        self.sea_level + self.delta
    }

    /// Same verdict as the overlay gives this feature
    pub fn check(&self, feature: &GeoFeature) -> Visibility {
        compute_visibility(feature.reference_altitude, self.sea_level, self.delta)
    }
}

/// Visible/submerged counts for the water-level summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TideStats {
    pub total: usize,
    pub visible: usize,
    pub submerged: usize,
}

/// Count features above and below the water line.
/// Features with unknown altitude count as submerged, as they are not visible.
pub fn summarize_tide(features: &[GeoFeature], level: EffectiveSeaLevel) -> TideStats {
    features.iter().fold(
        TideStats {
            total: features.len(),
            ..TideStats::default()
        },
        |mut stats, feature| {
            if level.check(feature).is_visible {
                stats.visible += 1;
            } else {
                stats.submerged += 1;
            }
            stats
        },
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TideFilter {
    All,
    Visible,
    Submerged,
}

/// Filter features by visibility and a case-insensitive name query
pub fn filter_features<'a>(
    features: &'a [GeoFeature],
    level: EffectiveSeaLevel,
    filter: TideFilter,
    query: &str,
) -> Vec<&'a GeoFeature> {
    let query = query.trim().to_lowercase();
    features
        .iter()
        .filter(|feature| {
            let visible = level.check(feature).is_visible;
            match filter {
                TideFilter::All => true,
                TideFilter::Visible => visible,
                TideFilter::Submerged => !visible,
            }
        })
        .filter(|feature| query.is_empty() || feature.name.to_lowercase().contains(&query))
        .collect()
}
