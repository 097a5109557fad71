//! Sensor smoothing and per-frame marker assembly

pub mod smoothing;
pub mod assembler;

pub use smoothing::{CircularSmoother, LinearSmoother, OrientationFilter};
pub use assembler::{FrameInput, FrameStats, MarkerAssembler};
