//! Geodesy, water-line visibility, view gating and screen projection

pub mod geodesy;
pub mod elevation;
pub mod visibility;
pub mod projection;

pub use geodesy::{angle_diff, bearing, destination, distance};
pub use elevation::{compute_visibility, EffectiveSeaLevel, TideFilter, TideStats, Visibility};
pub use visibility::{FovGate, GateDecision, Rejection, VisibilityMemory};
pub use projection::{PerspectiveProjector, Projection};
