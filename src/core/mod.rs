//! Core types and constants for the AR landmark overlay

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
