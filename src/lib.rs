//! Seamark AR
//!
//! Geo-projection and visibility engine for an augmented-reality overlay of
//! coastal landmarks. Given the user's location, compass heading, camera
//! pitch and the current tide, it decides which rocks and lights are in view,
//! whether they stand above the water, and where their labels go on screen.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod sensors;
pub mod validation;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use crate::core::{GeoFeature, GeoPoint, LocationFix, ScreenSize, EARTH_RADIUS_M};
pub use algorithms::geodesy::{bearing, distance};
pub use algorithms::elevation::{compute_visibility, Visibility};
pub use processing::{FrameInput, MarkerAssembler, OrientationFilter};
pub use sensors::{ScriptedSensorFeed, SensorEvent, SensorKind, SensorSubscription};
pub use validation::{ArError, ArResult, ConfigError, StoreError, ValidationError};
pub use utils::{ArConfig, ConfigurationManager, FeatureStore, TideSettings};
pub use api::{ArSession, MarkerLabel, RenderFrame, ScreenMarker, SessionStatus};
