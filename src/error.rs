//! This module defines all error types used throughout the application.
//!
//! Structural problems found in a diagram are not errors in this sense: they
//! are reported as [`crate::state_machine::Diagnostic`] records inside the
//! resulting definition.

use std::fmt;
use std::io;
use thiserror::Error;

/// Which arena an element lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Node => f.write_str("node"),
            ElementKind::Edge => f.write_str("edge"),
        }
    }
}

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// An element with the same ID already exists somewhere in the graph
    #[error("Duplicate {kind}: {id}")]
    DuplicateElement { kind: ElementKind, id: String },

    /// Lookup or removal of an element the graph does not hold
    #[error("Missing {kind}: {id}")]
    MissingElement { kind: ElementKind, id: String },

    /// Query against an attribute key that was never indexed
    #[error("Attribute index not found: {0}")]
    MissingAttrIndex(String),

    /// The attribute key is already indexed
    #[error("Attribute index already exists: {0}")]
    DuplicateAttrIndex(String),

    /// Participant IDs are restricted to [A-Za-z0-9_.-]
    #[error("Invalid participant ID: {0:?}")]
    InvalidParticipantId(String),

    /// Malformed graph interchange document
    #[error("Document error: {0}")]
    Document(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),

    /// Wrapped anyhow errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a document error
    pub fn document(msg: impl Into<String>) -> Self {
        Self::Document(msg.into())
    }

    pub fn duplicate(kind: ElementKind, id: impl Into<String>) -> Self {
        Self::DuplicateElement {
            kind,
            id: id.into(),
        }
    }

    pub fn missing(kind: ElementKind, id: impl Into<String>) -> Self {
        Self::MissingElement {
            kind,
            id: id.into(),
        }
    }

    /// Integrity failures abort an inference run; everything else is ambient
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            Error::DuplicateElement { .. }
                | Error::MissingElement { .. }
                | Error::MissingAttrIndex(_)
                | Error::DuplicateAttrIndex(_)
                | Error::InvalidParticipantId(_)
        )
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Document(format!("JSON error: {}", err))
    }
}

// Helper macros for creating errors

/// Create a custom error with formatting
#[macro_export]
macro_rules! custom_error {
    ($($arg:tt)*) => {
        $crate::error::Error::Custom(format!($($arg)*))
    };
}

/// Bail with a custom error message
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::custom_error!($($arg)*))
    };
}

/// Ensure a condition is true or return error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::custom("test error");
        assert_eq!(err.to_string(), "test error");

        let err = Error::duplicate(ElementKind::Node, "Task_1");
        assert_eq!(err.to_string(), "Duplicate node: Task_1");

        let err = Error::missing(ElementKind::Edge, "Flow_7");
        assert_eq!(err.to_string(), "Missing edge: Flow_7");
    }

    #[test]
    fn test_integrity_failures() {
        assert!(Error::MissingAttrIndex("type".into()).is_integrity_failure());
        assert!(Error::InvalidParticipantId("a b".into()).is_integrity_failure());
        assert!(!Error::document("bad").is_integrity_failure());
        assert!(!Error::custom("other").is_integrity_failure());
    }

    fn checked(flag: bool) -> Result<u8> {
        ensure!(flag, "flag was {}", flag);
        Ok(1)
    }

    #[test]
    fn test_ensure_macro() {
        assert_eq!(checked(true).unwrap(), 1);
        assert_eq!(checked(false).unwrap_err().to_string(), "flag was false");
    }
}
