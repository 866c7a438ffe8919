//! Unified error types for the network data model
//!
//! [`MepError`] covers everything that can go wrong while assembling,
//! configuring and validating a [`Network`](crate::Network). The optimization
//! crate wraps it in its own error type at the model-building boundary.
//!
//! # Example
//!
//! ```ignore
//! use mep_core::{MepResult, Network, ValidationMode};
//!
//! fn assemble() -> MepResult<()> {
//!     let network = build_network()?;
//!     let validated = network.into_validated(ValidationMode::Collect)?;
//!     Ok(())
//! }
//! ```

use crate::entities::ElementKind;
use crate::validation::ValidationReport;
use thiserror::Error;

/// Error type for network assembly, configuration and validation.
#[derive(Error, Debug)]
pub enum MepError {
    /// I/O errors (reading configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Network failed batch validation; carries every collected error
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    /// An element with the same name already exists in its collection
    #[error("Network element {kind} with name '{name}' has already been added")]
    DuplicateElement { kind: ElementKind, name: String },

    /// Configuration value out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using MepError.
pub type MepResult<T> = Result<T, MepError>;

impl From<anyhow::Error> for MepError {
    fn from(err: anyhow::Error) -> Self {
        MepError::Other(err.to_string())
    }
}

impl From<serde_json::Error> for MepError {
    fn from(err: serde_json::Error) -> Self {
        MepError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for MepError {
    fn from(err: serde_yaml::Error) -> Self {
        MepError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_display() {
        let err = MepError::DuplicateElement {
            kind: ElementKind::Bus,
            name: "EE_1".into(),
        };
        let text = err.to_string();
        assert!(text.contains("bus"));
        assert!(text.contains("'EE_1'"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MepError = io_err.into();
        assert!(matches!(err, MepError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> MepResult<()> {
            Err(MepError::Config("money_scale must be positive".into()))
        }

        fn outer() -> MepResult<()> {
            inner()?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
