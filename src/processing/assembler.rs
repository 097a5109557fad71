//! Per-frame marker assembly
//!
//! Runs every landmark through geodesy, the water-line check, the distance
//! and view gates, then projects the survivors and orders them nearest first.

use crate::algorithms::elevation::compute_visibility;
use crate::algorithms::geodesy::{bearing, distance};
use crate::algorithms::projection::PerspectiveProjector;
use crate::algorithms::visibility::{distance_prefilter, vertical_gate, FovGate, Rejection, VisibilityMemory};
use crate::api::types::ScreenMarker;
use crate::core::{GeoFeature, GeoPoint, ScreenSize};
use crate::utils::config::ArConfig;
use crate::utils::settings::TideSettings;
use crate::validation::data::parse_coordinates;

/// Camera pose and surface for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Latest location fix, `None` before the first fix
    pub location: Option<GeoPoint>,
    /// Calibrated heading (degrees)
    pub heading_deg: f64,
    /// Horizon-zero pitch (degrees, positive below the horizon)
    pub pitch_deg: f64,
    pub screen: ScreenSize,
    /// Monotonic clock (ms)
    pub now_ms: u64,
}

/// Per-frame counts of why features were dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub malformed: usize,
    pub too_close: usize,
    pub too_far: usize,
    pub submerged_far: usize,
    pub out_of_cone: usize,
    pub out_of_vertical_view: usize,
    pub emitted: usize,
}

impl FrameStats {
    fn reject(&mut self, reason: Rejection) {
        match reason {
            Rejection::TooClose => self.too_close += 1,
            Rejection::TooFar => self.too_far += 1,
            Rejection::SubmergedFar => self.submerged_far += 1,
            Rejection::OutOfCone => self.out_of_cone += 1,
            Rejection::OutOfVerticalView => self.out_of_vertical_view += 1,
        }
    }
}

/// Turns the feature collection and the current pose into an ordered render list.
///
/// Owns the visibility memory; everything else is recomputed every frame.
pub struct MarkerAssembler {
    config: ArConfig,
    gate: FovGate,
    projector: PerspectiveProjector,
    memory: VisibilityMemory,
    last_stats: FrameStats,
}

impl MarkerAssembler {
    pub fn new(config: ArConfig) -> Self {
        Self {
            gate: FovGate::from_config(&config),
            projector: PerspectiveProjector::from_config(&config),
            config,
            memory: VisibilityMemory::new(),
            last_stats: FrameStats::default(),
        }
    }

    pub fn config(&self) -> &ArConfig {
        &self.config
    }

    pub fn memory(&self) -> &VisibilityMemory {
        &self.memory
    }

    /// Rejection counts from the most recent frame
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Build the nearest-first marker list for one frame
    pub fn assemble(
        &mut self,
        features: &[GeoFeature],
        input: &FrameInput,
        settings: &TideSettings,
    ) -> Vec<ScreenMarker> {
        let mut stats = FrameStats::default();

        let Some(user) = input.location else {
            self.last_stats = stats;
            return Vec::new();
        };

        let mut markers = Vec::with_capacity(features.len());
        for feature in features {
            match self.place(feature, &user, input, settings) {
                Ok(Some(marker)) => markers.push(marker),
                Ok(None) => stats.malformed += 1,
                Err(reason) => stats.reject(reason),
            }
        }

        markers.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        stats.emitted = markers.len();

        log::trace!(
            "frame at {} ms: {} of {} features emitted ({:?})",
            input.now_ms,
            markers.len(),
            features.len(),
            stats
        );
        self.last_stats = stats;
        markers
    }

    /// Run one feature through the pipeline. `Ok(None)` means malformed geometry.
    fn place(
        &mut self,
        feature: &GeoFeature,
        user: &GeoPoint,
        input: &FrameInput,
        settings: &TideSettings,
    ) -> Result<Option<ScreenMarker>, Rejection> {
        let target = match parse_coordinates(&feature.coordinates) {
            Ok(point) => point,
            Err(e) => {
                log::debug!("skipping feature '{}': {}", feature.id, e);
                return Ok(None);
            }
        };

        let distance_m = distance(user, &target);
        let bearing_deg = bearing(user, &target);

        let visibility = compute_visibility(feature.reference_altitude, settings.sea_level, settings.delta);
        distance_prefilter(distance_m, &visibility, &self.config, settings.max_distance)?;
        vertical_gate(input.pitch_deg, distance_m, feature.reference_altitude, &self.config)?;

        let decision = self
            .gate
            .evaluate(&feature.id, bearing_deg, input.heading_deg, input.now_ms, &mut self.memory);
        if !decision.is_visible {
            return Err(Rejection::OutOfCone);
        }

        let projection = self
            .projector
            .project(decision.angle_diff, distance_m, input.pitch_deg, input.screen);

        Ok(Some(ScreenMarker {
            feature_id: feature.id.clone(),
            name: feature.name.clone(),
            screen_x: projection.position.x,
            screen_y: projection.position.y,
            label_offset_x: self.projector.label_offset(&feature.name),
            scale: projection.scale,
            opacity: projection.opacity,
            z_index: projection.z_index,
            distance_meters: distance_m,
            bearing_degrees: bearing_deg,
            angle_diff: decision.angle_diff,
            reference_altitude: feature.reference_altitude,
            visibility_height: visibility.visibility_height,
            above_water: visibility.above_water(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::geodesy::destination;
    use serde_json::json;

    fn user() -> GeoPoint {
        GeoPoint::new(48.40, -4.50)
    }

    fn input(heading_deg: f64, now_ms: u64) -> FrameInput {
        FrameInput {
            location: Some(user()),
            heading_deg,
            pitch_deg: 0.0,
            screen: ScreenSize::new(400.0, 800.0),
            now_ms,
        }
    }

    /// Landmark standing well above the default water line
    fn feature_at(name: &str, bearing_deg: f64, distance_m: f64) -> GeoFeature {
        let p = destination(&user(), bearing_deg, distance_m);
        GeoFeature::new(name, p.lat, p.lon).with_altitude(20.0)
    }

    #[test]
    fn test_end_to_end_due_east() {
        let mut assembler = MarkerAssembler::new(ArConfig::default());
        let features = vec![GeoFeature::new("Basse Est", 48.40, -4.48).with_altitude(12.0)];

        let markers = assembler.assemble(&features, &input(90.0, 0), &TideSettings::default());
        assert_eq!(markers.len(), 1);

        let marker = &markers[0];
        assert_eq!(marker.feature_id, "Basse Est");
        assert!((marker.distance_meters - 1480.0).abs() < 1480.0 * 0.05);
        assert!((marker.screen_x - 200.0).abs() < 2.0, "screen_x {}", marker.screen_x);
        assert!((marker.bearing_degrees - 90.0).abs() < 0.1);
        assert_eq!(marker.above_water, Some(true));
    }

    #[test]
    fn test_no_location_yields_empty() {
        let mut assembler = MarkerAssembler::new(ArConfig::default());
        let features = vec![feature_at("a", 90.0, 500.0)];
        let mut frame = input(90.0, 0);
        frame.location = None;
        assert!(assembler.assemble(&features, &frame, &TideSettings::default()).is_empty());
    }

    #[test]
    fn test_sorted_nearest_first() {
        let mut assembler = MarkerAssembler::new(ArConfig::default());
        let features = vec![
            feature_at("far", 85.0, 3000.0),
            feature_at("near", 95.0, 200.0),
            feature_at("mid", 90.0, 1200.0),
            feature_at("behind", 270.0, 400.0),
        ];

        let markers = assembler.assemble(&features, &input(90.0, 0), &TideSettings::default());
        let names: Vec<&str> = markers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["near", "mid", "far"]);
        assert!(markers.windows(2).all(|w| w[0].distance_meters <= w[1].distance_meters));
        assert!(markers[0].z_index > markers[2].z_index);
        assert_eq!(assembler.last_stats().out_of_cone, 1);
    }

    #[test]
    fn test_malformed_geometry_skipped() {
        let mut assembler = MarkerAssembler::new(ArConfig::default());
        let mut broken = feature_at("broken", 90.0, 500.0);
        broken.coordinates = json!([-4.49]);
        let mut text = feature_at("text", 90.0, 500.0);
        text.coordinates = json!(["-4.49", "48.40"]);
        let features = vec![broken, text, feature_at("ok", 90.0, 500.0)];

        let markers = assembler.assemble(&features, &input(90.0, 0), &TideSettings::default());
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].name, "ok");
        assert_eq!(assembler.last_stats().malformed, 2);
    }

    #[test]
    fn test_distance_bounds_and_submerged_rule() {
        let mut assembler = MarkerAssembler::new(ArConfig::default());
        let settings = TideSettings::new(8.0, 4.5, 1000.0);
        let features = vec![
            feature_at("too close", 90.0, 20.0),
            feature_at("too far", 90.0, 6000.0),
            feature_at("drowned far", 90.0, 2000.0).with_altitude(1.0),
            feature_at("drowned near", 90.0, 600.0).with_altitude(1.0),
            feature_at("dry far", 90.0, 2500.0).with_altitude(20.0),
        ];

        let markers = assembler.assemble(&features, &input(90.0, 0), &settings);
        let names: Vec<&str> = markers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["drowned near", "dry far"]);
        assert_eq!(markers[0].above_water, Some(false));
        assert_eq!(markers[1].above_water, Some(true));

        let stats = assembler.last_stats();
        assert_eq!(stats.too_close, 1);
        assert_eq!(stats.too_far, 1);
        assert_eq!(stats.submerged_far, 1);
    }

    #[test]
    fn test_unknown_altitude_follows_submerged_rule() {
        let mut assembler = MarkerAssembler::new(ArConfig::default());
        let mut near = feature_at("unknown near", 90.0, 600.0);
        near.reference_altitude = None;
        let mut far = feature_at("unknown far", 92.0, 2500.0);
        far.reference_altitude = None;

        let markers = assembler.assemble(&[near, far], &input(90.0, 0), &TideSettings::default());
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].name, "unknown near");
        assert_eq!(markers[0].above_water, None);
        assert_eq!(assembler.last_stats().submerged_far, 1);
    }

    #[test]
    fn test_overlay_agrees_with_tide_summary() {
        use crate::algorithms::elevation::{summarize_tide, EffectiveSeaLevel};

        let mut assembler = MarkerAssembler::new(ArConfig::default());
        let settings = TideSettings::default();
        let level = EffectiveSeaLevel::new(settings.sea_level, settings.delta);
        let features = vec![
            feature_at("five metres", 90.0, 600.0).with_altitude(5.0),
            feature_at("two metres", 95.0, 700.0).with_altitude(2.0),
            feature_at("at the line", 85.0, 800.0).with_altitude(3.5),
        ];

        let markers = assembler.assemble(&features, &input(90.0, 0), &settings);
        assert_eq!(markers.len(), 3);

        let above = markers.iter().filter(|m| m.above_water == Some(true)).count();
        let stats = summarize_tide(&features, level);
        assert_eq!(above, stats.visible);
        assert_eq!(markers.len() - above, stats.submerged);
        for marker in &markers {
            let feature = features.iter().find(|f| f.id == marker.feature_id).unwrap();
            assert_eq!(marker.above_water, Some(level.check(feature).is_visible));
        }
    }

    #[test]
    fn test_idempotent_frames() {
        let mut assembler = MarkerAssembler::new(ArConfig::default());
        let features = vec![
            feature_at("a", 80.0, 800.0),
            feature_at("edge", 112.5, 900.0),
            feature_at("b", 100.0, 1500.0),
        ];
        let frame = input(90.0, 1_000);
        let settings = TideSettings::default();

        let first = assembler.assemble(&features, &frame, &settings);
        let second = assembler.assemble(&features, &frame, &settings);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_hysteresis_across_frames() {
        let mut assembler = MarkerAssembler::new(ArConfig::default());
        let features = vec![feature_at("edge", 110.0, 900.0)];
        let settings = TideSettings::default();

        // Heading 90: 20° off axis, inside the strict cone
        assert_eq!(assembler.assemble(&features, &input(90.0, 0), &settings).len(), 1);
        // Heading 86.5: 23.5° off axis, only the near cone, still sticky
        assert_eq!(assembler.assemble(&features, &input(86.5, 300), &settings).len(), 1);
        // Refreshed at 300 ms, so still sticky at 850 ms
        assert_eq!(assembler.assemble(&features, &input(86.5, 850), &settings).len(), 1);
        // Looking away, then back 750 ms after the last refresh
        let mut far_frame = input(60.0, 900);
        assert!(assembler.assemble(&features, &far_frame, &settings).is_empty());
        far_frame.heading_deg = 86.5;
        far_frame.now_ms = 1_600;
        assert!(assembler.assemble(&features, &far_frame, &settings).is_empty());
    }
}
