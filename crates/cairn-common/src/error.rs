//! Error types for Cairn state handling
//!
//! These cover everything around the topology validator: decoding
//! manifests, reading and writing the state store, and configuration.
//! Invariant violations have their own type,
//! [`ValidationError`](crate::validation::ValidationError), so callers can
//! tell a broken topology apart from a failed read.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for Cairn state operations
#[derive(Debug, Error)]
pub enum Error {
    /// A requested object does not exist in the state store
    #[error("{kind} {name:?} not found")]
    NotFound {
        /// Object kind (Cluster, InstanceGroup)
        kind: String,
        /// Object name
        name: String,
    },

    /// An object being created already exists
    #[error("{kind} {name:?} already exists")]
    AlreadyExists {
        /// Object kind (Cluster, InstanceGroup)
        kind: String,
        /// Object name
        name: String,
    },

    /// Filesystem error in the state store
    #[error("io error at {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// Unknown or conflicting kinds in the scheme registry
    #[error("scheme error: {message}")]
    Scheme {
        /// Description of what failed
        message: String,
    },

    /// The state store URI names a backend Cairn cannot open
    #[error("unsupported state store {uri:?}: only file:// paths and memory:// are supported")]
    UnsupportedStateStore {
        /// The URI as given
        uri: String,
    },

    /// Missing or invalid configuration
    #[error("{message}")]
    Config {
        /// Description of what is missing
        message: String,
    },
}

impl Error {
    /// Create a not-found error for an object kind
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an already-exists error for an object kind
    pub fn already_exists(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an io error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create a scheme registry error
    pub fn scheme(msg: impl Into<String>) -> Self {
        Self::Scheme {
            message: msg.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Returns true for missing objects
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Get the resource kind if this error is associated with one
    pub fn kind(&self) -> Option<&str> {
        match self {
            Error::NotFound { kind, .. } | Error::AlreadyExists { kind, .. } => Some(kind),
            Error::Serialization { kind, .. } => kind.as_deref(),
            _ => None,
        }
    }
}
