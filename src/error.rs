//! ═══════════════════════════════════════════════════════════════════════════════
//! ERROR — Unified Error Type for Mythos
//! ═══════════════════════════════════════════════════════════════════════════════
//! Operational failures only (I/O, JSON, configuration, snapshot validation).
//! Expected data conditions (too few pairs, flat arrays) are values, see
//! [`crate::outcome::Analysis`].
//! ═══════════════════════════════════════════════════════════════════════════════

use thiserror::Error;

/// The unified error type for the Mythos crate
#[derive(Debug, Error)]
pub enum MythosError {
    /// I/O error (snapshot, config, report files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An analysis step that the caller required did not produce a result
    #[error("Analysis unavailable: {0}")]
    Analysis(String),
}

/// Configuration-specific errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// File not found
    #[error("Config file not found: {0}")]
    FileNotFound(String),
}

impl ConfigError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validation-specific errors (input snapshots, coordinates)
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// Input validation failed
    #[error("Invalid input for '{field}': {message}")]
    InvalidInput { field: String, message: String },

    /// Coordinate outside the unit interval
    #[error("Coordinate {axis} = {value} is outside [0, 1]")]
    CoordinateOutOfRange { axis: String, value: f64 },

    /// Wrong number of coordinate components
    #[error("Expected {expected} coordinates, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Type alias for Result with MythosError
pub type MythosResult<T> = Result<T, MythosError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MythosError::Config(ConfigError::invalid("alpha", "must be in (0, 1)"));
        assert!(err.to_string().contains("alpha"));

        let err = MythosError::Validation(ValidationError::CoordinateOutOfRange {
            axis: "light_shadow".to_string(),
            value: 1.5,
        });
        assert!(err.to_string().contains("light_shadow"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: MythosError = io_err.into();
        assert!(matches!(err, MythosError::Io(_)));
    }
}
