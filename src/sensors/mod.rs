//! Sensor abstraction for the platform location, compass and motion streams
//!
//! The platform pushes samples into the session as `SensorEvent`s. Each
//! stream is held open by a `SensorSubscription` that the session removes
//! when it is torn down.

pub mod mock;

pub use mock::ScriptedSensorFeed;

use crate::core::LocationFix;
use serde::{Deserialize, Serialize};

/// Platform sensor streams consumed by the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    Location,
    Heading,
    Motion,
}

/// One sample (or permission failure) from a platform stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorEvent {
    Location(LocationFix),
    /// True-north heading (degrees); negative means unavailable
    Heading(f64),
    /// Horizon-zero pitch (degrees, positive below the horizon)
    Pitch(f64),
    PermissionDenied(SensorKind),
}

impl SensorEvent {
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorEvent::Location(_) => SensorKind::Location,
            SensorEvent::Heading(_) => SensorKind::Heading,
            SensorEvent::Pitch(_) => SensorKind::Motion,
            SensorEvent::PermissionDenied(kind) => *kind,
        }
    }
}

/// Handle keeping a platform stream alive
pub trait SensorSubscription {
    fn kind(&self) -> SensorKind;

    /// Stop the stream. Must be idempotent.
    fn remove(&mut self);
}
