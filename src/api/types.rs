//! Render-facing data produced by the AR pipeline

use crate::sensors::SensorKind;
use serde::{Deserialize, Serialize};

/// One overlay label placed on the camera feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenMarker {
    pub feature_id: String,
    /// Display label
    pub name: String,
    /// Marker anchor in pixels from the left edge
    pub screen_x: f64,
    /// Marker anchor in pixels from the top edge
    pub screen_y: f64,
    /// Horizontal shift that centers the label on its anchor (pixels)
    pub label_offset_x: f64,
    pub scale: f64,
    pub opacity: f64,
    pub z_index: i32,
    pub distance_meters: f64,
    pub bearing_degrees: f64,
    /// Signed offset from the camera heading (degrees)
    pub angle_diff: f64,
    pub reference_altitude: Option<f64>,
    /// Height above the effective water line, if the altitude is known
    pub visibility_height: Option<f64>,
    pub above_water: Option<bool>,
}

/// What the session can currently show
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SessionStatus {
    WaitingForLocation,
    PermissionDenied(SensorKind),
    Tracking {
        in_view: usize,
        total: usize,
        heading_deg: f64,
    },
}

/// Ordered markers plus the status line shown under them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// Nearest first
    pub markers: Vec<ScreenMarker>,
    pub status: SessionStatus,
}

impl RenderFrame {
    pub fn empty(status: SessionStatus) -> Self {
        Self {
            markers: Vec::new(),
            status,
        }
    }

    pub fn status_line(&self) -> String {
        crate::api::formatting::status_line(&self.status)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
