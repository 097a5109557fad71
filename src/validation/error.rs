use thiserror::Error;

/// Crate-wide result alias
pub type ArResult<T> = Result<T, ArError>;

/// Problems with feature geometry or document shape
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("coordinates are not an array: {found}")]
    NotAnArray { found: String },
    #[error("coordinates have {len} members, expected at least 2")]
    TooShort { len: usize },
    #[error("coordinate member {index} is not a finite number")]
    NonNumeric { index: usize },
    #[error("latitude {lat} outside [-90, 90]")]
    LatitudeOutOfRange { lat: f64 },
    #[error("longitude {lon} outside [-180, 180]")]
    LongitudeOutOfRange { lon: f64 },
    #[error("feature {index} has no name")]
    MissingName { index: usize },
}

/// Configuration value and file errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value {value} for {parameter}: {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },
    #[error("I/O error: {message}")]
    IoError { message: String },
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Persisted feature document errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("invalid JSON: 'features' array is missing")]
    MissingFeatures,
    #[error("failed to parse document: {message}")]
    Parse { message: String },
    #[error("I/O error: {message}")]
    Io { message: String },
}

/// Top-level error for fallible (non per-frame) operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::TooShort { len: 1 };
        assert_eq!(err.to_string(), "coordinates have 1 members, expected at least 2");

        let err: ArError = StoreError::MissingFeatures.into();
        assert_eq!(err.to_string(), "invalid JSON: 'features' array is missing");
    }

    #[test]
    fn test_config_error_wraps() {
        let err: ArError = ConfigError::InvalidParameter {
            parameter: "heading_alpha".to_string(),
            value: "0".to_string(),
            reason: "must be in (0, 1]".to_string(),
        }
        .into();
        assert!(matches!(err, ArError::Config(_)));
        assert!(err.to_string().contains("heading_alpha"));
    }
}
