//! Human-readable text for marker labels and the status overlay

use crate::api::types::{ScreenMarker, SessionStatus};
use crate::sensors::SensorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text lines shown inside a marker bubble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerLabel {
    pub title: String,
    pub distance: String,
    pub altitude: Option<String>,
}

impl MarkerLabel {
    pub fn for_marker(marker: &ScreenMarker) -> Self {
        Self {
            title: marker.name.clone(),
            distance: format_distance(marker.distance_meters),
            altitude: marker.reference_altitude.map(|alt| format!("{} m", format_meters(alt))),
        }
    }
}

impl fmt::Display for MarkerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.distance)?;
        if let Some(alt) = &self.altitude {
            write!(f, " [{}]", alt)?;
        }
        Ok(())
    }
}

/// "850 m" below a kilometer, "1.2 km" above
pub fn format_distance(distance_m: f64) -> String {
    if distance_m < 1000.0 {
        format!("{:.0} m", distance_m)
    } else {
        format!("{:.1} km", distance_m / 1000.0)
    }
}

/// Drop a trailing ".0" so whole altitudes read as "12 m"
fn format_meters(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorKind::Location => "Location",
            SensorKind::Heading => "Compass",
            SensorKind::Motion => "Motion",
        };
        f.write_str(name)
    }
}

/// One-line summary shown below the camera feed
pub fn status_line(status: &SessionStatus) -> String {
    match status {
        SessionStatus::WaitingForLocation => "Waiting for location...".to_string(),
        SessionStatus::PermissionDenied(kind) => format!("{} permission denied", kind),
        SessionStatus::Tracking {
            in_view,
            total,
            heading_deg,
        } => format!(
            "{} of {} landmarks in view · heading {:.0}°",
            in_view, total, heading_deg
        ),
    }
}
