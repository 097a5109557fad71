//! Physical constants and tuned defaults for the AR overlay

/// Mean Earth radius used by the Haversine formulas (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Camera horizontal field of view (degrees)
pub const HORIZONTAL_FOV_DEG: f64 = 50.0;
/// Camera vertical field of view (degrees), only used when vertical gating is on
pub const VERTICAL_FOV_DEG: f64 = 35.0;
/// Inner margin keeping markers away from the cone edge (degrees)
pub const FOV_MARGIN_DEG: f64 = 3.0;
/// Extra cone width granted to recently visible markers (degrees)
pub const HYSTERESIS_DEG: f64 = 3.0;
/// How long a marker stays sticky after leaving the strict cone (ms)
pub const VISIBILITY_STICK_MS: u64 = 600;

pub const SMOOTHING_ALPHA_HEADING: f64 = 0.2;
pub const SMOOTHING_ALPHA_PITCH: f64 = 0.3;
/// Heading changes below this are treated as magnetometer jitter (degrees)
pub const HEADING_DEADZONE_DEG: f64 = 0.3;
pub const HEADING_OFFSET_DEG: f64 = 0.0;

pub const MIN_DISTANCE_M: f64 = 50.0;
pub const MAX_DISTANCE_M: f64 = 5000.0;
/// Distance at which a marker is considered at the back of the scene (m)
pub const MAX_DEPTH_M: f64 = 3000.0;

/// Default tide settings shown before the user edits them
pub const DEFAULT_SEA_LEVEL_M: f64 = 8.0;
pub const DEFAULT_DELTA_M: f64 = 4.5;
pub const DEFAULT_SUBMERGED_MAX_DISTANCE_M: f64 = 1000.0;
