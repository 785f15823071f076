//! Error types for reflective operations
//!
//! The variants mirror the failure categories of a JVM-style reflection
//! facility. Every query reports exactly one of these and callers (including
//! [`ClassHandle`](crate::ClassHandle)) pass them through untouched.

use thiserror::Error;

/// Reflection result type
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Failures surfaced by class resolution, member lookup and instantiation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReflectError {
    /// Name resolution found no class
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    /// A class referenced by an already loaded class is unavailable
    #[error("No class definition found: {0}")]
    NoClassDefFound(String),

    /// Field lookup failed
    #[error("No such field: {0}")]
    NoSuchField(String),

    /// Method or constructor lookup failed
    #[error("No such method: {0}")]
    NoSuchMethod(String),

    /// Member exists but is not accessible
    #[error("Illegal access: {0}")]
    IllegalAccess(String),

    /// The security policy denied the operation
    #[error("Access denied: {0}")]
    Security(String),

    /// The class cannot be instantiated
    #[error("Instantiation failed: {0}")]
    Instantiation(String),

    /// Checked narrowing failed
    #[error("Class cast: {0}")]
    ClassCast(String),

    /// Wrong number or type of arguments
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// A static initializer failed
    #[error("Exception in initializer of {class}: {message}")]
    ExceptionInInitializer {
        /// Class whose initializer failed
        class: String,
        /// Failure reported by the initializer
        message: String,
    },

    /// A constructor or method body failed
    #[error("Invocation failed: {0}")]
    InvocationTarget(String),

    /// A loader rejected a class or package definition
    #[error("Definition error: {0}")]
    Definition(String),
}

impl ReflectError {
    /// Whether this error belongs to the resolution category
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            ReflectError::ClassNotFound(_) | ReflectError::NoClassDefFound(_)
        )
    }
}

impl From<serde_json::Error> for ReflectError {
    fn from(err: serde_json::Error) -> Self {
        ReflectError::Definition(format!("invalid class descriptor JSON: {}", err))
    }
}

/// Errors that can occur while loading a runtime configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not meaningful
    #[error("Invalid config: {0}")]
    Invalid(String),
}
