//! Data validation and error types

pub mod data;
pub mod error;

pub use data::{numeric_property, parse_coordinates};
pub use error::{ArError, ArResult, ConfigError, StoreError, ValidationError};
