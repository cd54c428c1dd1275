//! # Error Types
//!
//! Structured error types for deck_core. Only fatal input problems become
//! errors; advisory findings (load-zone overflow, bend-radius non-compliance)
//! are carried as data on the result types so the geometry is still produced.
//!
//! ## Example
//!
//! ```rust
//! use deck_core::errors::{DeckError, DeckResult};
//!
//! fn validate_width(index: usize, bz1: f64) -> DeckResult<()> {
//!     if bz1 <= 0.0 {
//!         return Err(DeckError::invalid_input(
//!             format!("segments[{}].bz1", index),
//!             bz1.to_string(),
//!             "Zone width must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_width(0, -1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for deck_core operations
pub type DeckResult<T> = Result<T, DeckError>;

/// Structured error type for bridge operations.
///
/// Each variant names the offending field (including the row or zone index)
/// so a caller can point the user at the exact input to fix.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum DeckError {
    /// An input value is invalid (out of range, non-positive, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// The bridge has no segments at all
    #[error("Bridge has no segments - at least two rows are needed to build a deck")]
    EmptyBridge,

    /// A reinforcement zone identifier is not of the form `location-segment`
    #[error("Invalid zone identifier '{id}': {reason}")]
    InvalidZoneId { id: String, reason: String },

    /// Engine configuration is invalid
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON/TOML serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl DeckError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        DeckError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidZoneId error
    pub fn invalid_zone_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        DeckError::InvalidZoneId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a ConfigError
    pub fn config_error(reason: impl Into<String>) -> Self {
        DeckError::ConfigError {
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        DeckError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        DeckError::SerializationError {
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            DeckError::InvalidInput { .. } => "INVALID_INPUT",
            DeckError::EmptyBridge => "EMPTY_BRIDGE",
            DeckError::InvalidZoneId { .. } => "INVALID_ZONE_ID",
            DeckError::ConfigError { .. } => "CONFIG_ERROR",
            DeckError::FileError { .. } => "FILE_ERROR",
            DeckError::SerializationError { .. } => "SERIALIZATION_ERROR",
            DeckError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = DeckError::invalid_input("segments[1].bz2", "-5", "Zone width must be positive");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: DeckError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_unit_variant_serialization() {
        let json = serde_json::to_string(&DeckError::EmptyBridge).unwrap();
        assert!(json.contains("EmptyBridge"));
        let roundtrip: DeckError = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, DeckError::EmptyBridge);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(DeckError::config_error("bad tolerance").error_code(), "CONFIG_ERROR");
        assert_eq!(DeckError::invalid_zone_id("4-1", "location out of range").error_code(), "INVALID_ZONE_ID");
        assert_eq!(DeckError::EmptyBridge.error_code(), "EMPTY_BRIDGE");
    }

    #[test]
    fn test_message_names_field() {
        let error = DeckError::invalid_input("segments[2].dz", "0", "Thickness must be positive");
        assert!(error.to_string().contains("segments[2].dz"));
    }
}
