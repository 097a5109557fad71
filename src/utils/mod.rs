//! Configuration and user settings

pub mod config;
pub mod settings;

pub use config::{ArConfig, ConfigurationManager};
pub use settings::{parse_decimal_input, FeatureDocument, FeatureStore, TideSettings};
