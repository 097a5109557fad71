//! Session, render-facing types and text formatting for the overlay
//!
//! `ArSession` is the entry point for a host UI: it takes sensor events and
//! produces `RenderFrame`s ready to be drawn over the camera feed.

pub mod session;
pub mod types;
pub mod formatting;

pub use session::{ArSession, CallbackHandle, FrameCallback};
pub use types::{RenderFrame, ScreenMarker, SessionStatus};
pub use formatting::{format_distance, status_line, MarkerLabel};
