//! Error types for netonboard.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::job::FailReason;
use crate::path::PathError;

/// Main error type for netonboard operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Mapping document errors (fatal, raised before any host runs)
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Errors while building one host's record
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// Collection failures reported by the connectivity layer
    #[error("Collect error: {0}")]
    Collect(#[from] CollectError),
}

/// Configuration errors in a field-mapping document.
///
/// These are raised once, when a platform mapping is loaded, so a bad
/// platform definition fails fast instead of degrading every host.
#[derive(Error, Debug)]
pub enum MappingError {
    /// Document could not be read
    #[error("Failed to read mapping file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Document is not valid YAML or does not match the mapping schema
    #[error("Invalid mapping document for platform '{platform}': {source}")]
    Parse {
        platform: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Path expression could not be parsed
    #[error("Invalid path for '{field}' ('{path}'): {source}")]
    InvalidPath {
        field: String,
        path: String,
        #[source]
        source: PathError,
    },

    /// Interface type rule pattern is not a valid regex
    #[error("Invalid interface type pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Field entry is structurally incomplete
    #[error("Invalid entry for '{field}': {message}")]
    InvalidField { field: String, message: String },

    /// No mapping is registered for the platform
    #[error("Unknown platform: {name}")]
    UnknownPlatform { name: String },

    /// A mapping is already registered under this name
    #[error("Platform already registered: {name}")]
    AlreadyRegistered { name: String },
}

/// Errors raised while aggregating one host's record.
///
/// Data absence is never an error; these cover raw data whose shape the
/// engine cannot safely interpret.
#[derive(Error, Debug)]
pub enum HostError {
    /// An interface record carries a name that is not a string
    #[error("Host '{host}': interface name under '{name_key}' from '{command}' is not a string: {found}")]
    InvalidInterfaceName {
        host: String,
        command: String,
        name_key: String,
        found: String,
    },

    /// Neither the host nor the job names a platform
    #[error("Host '{host}': no platform set")]
    NoPlatform { host: String },

    /// The host's platform has no mapping section for the requested job
    #[error("Host '{host}': platform '{platform}' has no '{section}' mapping")]
    MissingSection {
        host: String,
        platform: String,
        section: &'static str,
    },

    /// Extraction panicked or was torn down on the worker pool
    #[error("Host '{host}': extraction aborted: {message}")]
    Aborted { host: String, message: String },
}

/// A session failure reported by the connectivity collaborator.
#[derive(Error, Debug, Clone)]
#[error("{reason}: {message}")]
pub struct CollectError {
    /// Classified failure reason.
    pub reason: FailReason,

    /// Human readable detail.
    pub message: String,
}

impl CollectError {
    /// Create a new collection error.
    pub fn new(reason: FailReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

impl Error {
    /// Classify the error for the per-host job report.
    pub fn fail_reason(&self) -> FailReason {
        match self {
            Error::Mapping(_) => FailReason::Config,
            Error::Host(HostError::NoPlatform { .. } | HostError::MissingSection { .. }) => {
                FailReason::Config
            }
            Error::Host(_) => FailReason::General,
            Error::Collect(err) => err.reason,
        }
    }
}

/// Result type alias using netonboard's Error.
pub type Result<T> = std::result::Result<T, Error>;
