//! Error types for registry and tool operations.
//!
//! [`RegistryError`] covers scanning, lookup, and persistence. [`ToolError`]
//! is what an individual tool reports from its own operations (construction,
//! reference parsing, subsystem invocation, template instantiation).

use thiserror::Error;

use crate::tool::Capability;

/// Errors raised by the registry, catalog, and configuration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A marker version string is not a valid version.
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// A unit could not produce its registrations.
    #[error("unit '{unit}' could not be loaded: {reason}")]
    UnitLoad { unit: String, reason: String },

    /// A registered type failed to construct.
    #[error("failed to construct {type_name}: {source}")]
    Construction {
        type_name: &'static str,
        #[source]
        source: ToolError,
    },

    /// A factory produced an instance of a different capability than declared.
    #[error("{type_name} is registered as {expected} but constructs a {actual} tool")]
    CapabilityMismatch {
        type_name: &'static str,
        expected: Capability,
        actual: Capability,
    },
}

/// Convenience alias for results with [`RegistryError`].
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors reported by tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool could not be created.
    #[error("{0}")]
    Construction(String),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A linker reference is malformed.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A project file is missing, ambiguous, or unreadable.
    #[error("project error: {0}")]
    Project(String),

    /// Template instantiation failed.
    #[error("template error: {0}")]
    Template(String),

    /// Lookup of another tool failed.
    #[error(transparent)]
    Registry(#[from] Box<RegistryError>),
}

impl From<RegistryError> for ToolError {
    fn from(err: RegistryError) -> Self {
        Self::Registry(Box::new(err))
    }
}
