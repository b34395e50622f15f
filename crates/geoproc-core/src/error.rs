//! Error types for GeoProc

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoprocError {
    // Operation input errors
    #[error("{operation} operation received {count} layers; {reason}")]
    InvalidArity {
        operation: String,
        count: usize,
        reason: String,
    },

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    // CRS errors
    #[error("Invalid CRS '{code}': {reason}")]
    InvalidCrs { code: String, reason: String },

    #[error("Projection failed: {reason}")]
    Projection { reason: String },

    #[error("Invalid geometry at feature {feature_id}: {reason}")]
    InvalidGeometry {
        feature_id: String,
        reason: String,
    },

    // Generator errors
    #[error("Generator unavailable: {reason}. {remediation}")]
    GeneratorUnavailable { reason: String, remediation: String },

    #[error("Generation failed: {reason}")]
    Generation { reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeoprocError {
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        GeoprocError::InvalidParameter { name: name.into(), reason: reason.into() }
    }

    pub fn projection(reason: impl Into<String>) -> Self {
        GeoprocError::Projection { reason: reason.into() }
    }
}

impl From<serde_json::Error> for GeoprocError {
    fn from(e: serde_json::Error) -> Self {
        GeoprocError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeoprocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_message_names_count() {
        let err = GeoprocError::InvalidArity {
            operation: "buffer".to_string(),
            count: 2,
            reason: "only one layer can be buffered at a time".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "buffer operation received 2 layers; only one layer can be buffered at a time"
        );
    }
}
