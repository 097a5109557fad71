//! Field-of-view gating with temporal hysteresis
//!
//! A landmark is in view when its bearing falls inside the strict cone
//! `|diff| < half_fov - margin`. Landmarks that were in view less than
//! `stickiness_window_ms` ago also pass inside the wider near cone
//! `|diff| < half_fov - margin + hysteresis`, which stops edge flicker when
//! compass noise straddles the boundary.
//!
//! Distance bounds and the submerged-far rule run before the angular test.

use crate::algorithms::elevation::Visibility;
use crate::algorithms::geodesy::angle_diff;
use crate::utils::config::ArConfig;
use std::collections::HashMap;

/// Last time (monotonic ms) each feature passed the gate
#[derive(Debug, Clone, Default)]
pub struct VisibilityMemory {
    last_visible_ms: HashMap<String, u64>,
}

impl VisibilityMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_visible(&self, id: &str) -> Option<u64> {
        self.last_visible_ms.get(id).copied()
    }

    /// Milliseconds since the feature was last visible, `None` if never seen
    pub fn time_since_visible(&self, id: &str, now_ms: u64) -> Option<u64> {
        self.last_visible(id).map(|t| now_ms.saturating_sub(t))
    }

    pub fn mark_visible(&mut self, id: &str, now_ms: u64) {
        match self.last_visible_ms.get_mut(id) {
            Some(t) => *t = now_ms,
            None => {
                self.last_visible_ms.insert(id.to_string(), now_ms);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.last_visible_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_visible_ms.is_empty()
    }
}

/// Why a feature was left out of the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooClose,
    TooFar,
    SubmergedFar,
    OutOfCone,
    OutOfVerticalView,
}

/// Outcome of the angular test for one feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    /// Signed offset from the heading, in (-180, 180]
    pub angle_diff: f64,
    pub in_cone_strict: bool,
    pub in_cone_near: bool,
    pub is_visible: bool,
}

/// Horizontal cone test with stickiness
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovGate {
    pub horizontal_fov_deg: f64,
    pub fov_margin_deg: f64,
    pub hysteresis_margin_deg: f64,
    pub stickiness_window_ms: u64,
}

impl FovGate {
    pub fn from_config(config: &ArConfig) -> Self {
        Self {
            horizontal_fov_deg: config.horizontal_fov_deg,
            fov_margin_deg: config.fov_margin_deg,
            hysteresis_margin_deg: config.hysteresis_margin_deg,
            stickiness_window_ms: config.stickiness_window_ms,
        }
    }

    pub fn strict_limit(&self) -> f64 {
        self.horizontal_fov_deg / 2.0 - self.fov_margin_deg
    }

    pub fn near_limit(&self) -> f64 {
        self.strict_limit() + self.hysteresis_margin_deg
    }

    /// Decide visibility and refresh the feature's timestamp when it passes
    pub fn evaluate(
        &self,
        id: &str,
        target_bearing: f64,
        heading: f64,
        now_ms: u64,
        memory: &mut VisibilityMemory,
    ) -> GateDecision {
        let diff = angle_diff(target_bearing, heading);
        let in_cone_strict = diff.abs() < self.strict_limit();
        let in_cone_near = diff.abs() < self.near_limit();

        let recently_visible = memory
            .time_since_visible(id, now_ms)
            .map_or(false, |elapsed| elapsed < self.stickiness_window_ms);

        let is_visible = in_cone_strict || (in_cone_near && recently_visible);
        if is_visible {
            memory.mark_visible(id, now_ms);
        }

        GateDecision {
            angle_diff: diff,
            in_cone_strict,
            in_cone_near,
            is_visible,
        }
    }
}

/// Distance bounds and the submerged-far exclusion.
///
/// Anything not visible above water counts as submerged here, including
/// landmarks of unknown altitude.
pub fn distance_prefilter(
    distance_m: f64,
    visibility: &Visibility,
    config: &ArConfig,
    submerged_max_distance_m: f64,
) -> Result<(), Rejection> {
    if !visibility.is_visible && distance_m > submerged_max_distance_m {
        return Err(Rejection::SubmergedFar);
    }
    if distance_m < config.min_distance_m {
        return Err(Rejection::TooClose);
    }
    if distance_m > config.max_distance_m {
        return Err(Rejection::TooFar);
    }
    Ok(())
}

/// Elevation angle of a landmark seen from sea level (degrees)
pub fn elevation_angle(distance_m: f64, altitude_m: Option<f64>) -> f64 {
    let height = altitude_m.filter(|a| a.is_finite()).unwrap_or(0.0);
    height.atan2(distance_m.max(f64::EPSILON)).to_degrees()
}

/// Pitch-based exclusion, used only when `vertical_gating` is on.
///
/// The camera aims at `-pitch_deg` above the horizon, so the gap to a
/// landmark's elevation angle is `pitch + elevation`.
pub fn vertical_gate(
    pitch_deg: f64,
    distance_m: f64,
    altitude_m: Option<f64>,
    config: &ArConfig,
) -> Result<(), Rejection> {
    if !config.vertical_gating {
        return Ok(());
    }
    let offset = pitch_deg + elevation_angle(distance_m, altitude_m);
    if offset.abs() <= config.vertical_fov_deg / 2.0 {
        Ok(())
    } else {
        Err(Rejection::OutOfVerticalView)
    }
}
