//! State store for cluster specifications
//!
//! The state store holds the Cluster and InstanceGroup documents that the
//! lifecycle commands read and write. It is addressed by a URI given with
//! `--state`:
//!
//! - `file:///var/cairn` or a bare path: [`FsStateStore`]
//! - `memory://`: an empty [`MemoryStateStore`], mostly useful for tests
//!
//! Object-storage backends (`s3://`, `gs://`) are not available.

mod fs;
mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

pub use fs::FsStateStore;
pub use memory::MemoryStateStore;

use crate::crd::{Cluster, InstanceGroup};
use crate::scheme::Scheme;
use crate::{Error, Result};

/// Read and write access to stored cluster specifications
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Fetch a cluster, `None` if it does not exist
    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>>;

    /// InstanceGroups of a cluster, sorted by name
    async fn list_instance_groups(&self, cluster: &str) -> Result<Vec<InstanceGroup>>;

    /// Store a new cluster; fails if one with the same name exists
    async fn create_cluster(&self, cluster: &Cluster) -> Result<()>;

    /// Replace an existing cluster; fails if it does not exist
    async fn update_cluster(&self, cluster: &Cluster) -> Result<()>;

    /// Create or replace an InstanceGroup of an existing cluster
    async fn put_instance_group(&self, cluster: &str, group: &InstanceGroup) -> Result<()>;
}

/// Open the state store addressed by `uri`
pub fn open_state_store(uri: &str, scheme: Arc<Scheme>) -> Result<Box<dyn StateStore>> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(Error::config(
            "--state is required (or set CAIRN_STATE_STORE)",
        ));
    }

    if let Some(path) = uri.strip_prefix("file://") {
        return Ok(Box::new(FsStateStore::new(PathBuf::from(path), scheme)));
    }
    if uri == "memory://" {
        return Ok(Box::new(MemoryStateStore::new()));
    }
    if uri.contains("://") {
        return Err(Error::UnsupportedStateStore {
            uri: uri.to_string(),
        });
    }
    Ok(Box::new(FsStateStore::new(PathBuf::from(uri), scheme)))
}

/// Reject names that cannot be used as a single path component
///
/// Every backend applies this to Cluster and InstanceGroup names, so callers
/// that write several objects can check all names before the first write.
pub fn check_object_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::config(format!("{kind} name cannot be empty")));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::config(format!("invalid {kind} name {name:?}")));
    }
    Ok(())
}
