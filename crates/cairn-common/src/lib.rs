//! Common types for Cairn: cluster specifications, topology validation and
//! state storage

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod scheme;
pub mod store;
pub mod validation;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Environment variable naming the state store when `--state` is not given
pub const STATE_STORE_ENV: &str = "CAIRN_STATE_STORE";
