//! Exponential smoothing of compass heading and camera pitch
//!
//! Pitch is measured from the horizon and is positive when the camera points
//! below it, matching the platform tilt reading converted by
//! `pitch_from_device_beta`.

use crate::algorithms::geodesy::{angle_diff, normalize_degrees};
use crate::utils::config::ArConfig;

/// Exponential moving average for a linear quantity (pitch).
///
/// The first sample seeds the filter; every later sample moves the output
/// `alpha` of the way toward it.
#[derive(Debug, Clone)]
pub struct LinearSmoother {
    /// Smoothing factor (0-1, higher means more weight on new samples)
    pub alpha: f64,
    value: Option<f64>,
}

impl LinearSmoother {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            value: None,
        }
    }

    /// Feed a raw sample and return the smoothed value
    pub fn update(&mut self, raw: f64) -> f64 {
        if !raw.is_finite() {
            return self.value.unwrap_or(0.0);
        }
        let next = match self.value {
            None => raw,
            Some(prev) => prev + self.alpha * (raw - prev),
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Exponential moving average for a compass heading.
///
/// Interpolates along the shortest arc so 359° -> 2° moves forward by 3°,
/// and ignores changes smaller than the dead-zone.
#[derive(Debug, Clone)]
pub struct CircularSmoother {
    pub alpha: f64,
    /// Changes below this are treated as magnetometer jitter (degrees)
    pub deadzone_deg: f64,
    value: Option<f64>,
}

impl CircularSmoother {
    pub fn new(alpha: f64, deadzone_deg: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            deadzone_deg: deadzone_deg.max(0.0),
            value: None,
        }
    }

    /// Feed a raw heading (degrees) and return the smoothed heading in [0, 360)
    pub fn update(&mut self, raw: f64) -> f64 {
        if !raw.is_finite() {
            return self.value.unwrap_or(0.0);
        }
        let raw = normalize_degrees(raw);
        let next = match self.value {
            None => raw,
            Some(prev) => {
                let delta = angle_diff(raw, prev);
                if delta.abs() < self.deadzone_deg {
                    return prev;
                }
                normalize_degrees(prev + self.alpha * delta)
            }
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Apply a fixed compass calibration to a smoothed heading
pub fn display_heading(smoothed_deg: f64, offset_deg: f64) -> f64 {
    normalize_degrees(smoothed_deg + offset_deg)
}

/// Convert the platform tilt reading (90° = portrait aimed at the horizon,
/// lower values = camera aimed down) into horizon-zero pitch, positive below
/// the horizon and bounded to [-90, 90]
pub fn pitch_from_device_beta(beta_deg: f64) -> f64 {
    (90.0 - beta_deg).clamp(-90.0, 90.0)
}

/// Heading and pitch filters of one AR session
#[derive(Debug, Clone)]
pub struct OrientationFilter {
    heading: CircularSmoother,
    pitch: LinearSmoother,
    heading_offset_deg: f64,
}

impl OrientationFilter {
    pub fn from_config(config: &ArConfig) -> Self {
        Self {
            heading: CircularSmoother::new(config.heading_alpha, config.heading_deadzone_deg),
            pitch: LinearSmoother::new(config.pitch_alpha),
            heading_offset_deg: config.heading_offset_deg,
        }
    }

    /// Smooth a raw heading; returns the calibrated display heading
    pub fn update_heading(&mut self, raw_deg: f64) -> f64 {
        let smoothed = self.heading.update(raw_deg);
        display_heading(smoothed, self.heading_offset_deg)
    }

    /// Smooth a raw horizon-zero pitch
    pub fn update_pitch(&mut self, raw_deg: f64) -> f64 {
        self.pitch.update(raw_deg.clamp(-90.0, 90.0))
    }

    /// Calibrated heading, `None` before the first compass sample
    pub fn heading(&self) -> Option<f64> {
        self.heading
            .value()
            .map(|h| display_heading(h, self.heading_offset_deg))
    }

    /// Smoothed pitch, 0 (horizon) before the first tilt sample
    pub fn pitch(&self) -> f64 {
        self.pitch.value().unwrap_or(0.0)
    }
}
