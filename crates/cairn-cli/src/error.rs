//! Error types for the CLI

use std::path::PathBuf;

use cairn_common::validation::ValidationError;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The cluster topology violates an invariant
    #[error("{0}")]
    Invalid(#[from] ValidationError),

    /// Several invariants are violated (aggregate mode)
    #[error("{}", format_violations(.0))]
    InvalidAll(Vec<ValidationError>),

    /// Scheme, state store or configuration failure
    #[error("{0}")]
    Store(#[from] cairn_common::Error),

    #[error("error reading {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bad combination of flags and arguments
    #[error("{message}")]
    Usage { message: String },

    #[error("{message}")]
    CommandFailed { message: String },
}

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Error::Usage {
            message: message.into(),
        }
    }

    pub fn command_failed(message: impl Into<String>) -> Self {
        Error::CommandFailed {
            message: message.into(),
        }
    }

    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the cluster topology was rejected
    pub fn is_invalid(&self) -> bool {
        matches!(self, Error::Invalid(_) | Error::InvalidAll(_))
    }
}

fn format_violations(errors: &[ValidationError]) -> String {
    let mut out = format!("found {} validation error(s):", errors.len());
    for err in errors {
        out.push_str("\n  - ");
        out.push_str(&err.to_string());
    }
    out
}
