//! Filesystem-backed state store
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<cluster>/config                    Cluster document
//! <root>/<cluster>/instancegroup/<name>      one InstanceGroup document each
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{check_object_name, StateStore};
use crate::crd::{Cluster, InstanceGroup};
use crate::scheme::{Object, Scheme};
use crate::{Error, Result};

const CLUSTER_FILE: &str = "config";
const INSTANCE_GROUP_DIR: &str = "instancegroup";

/// State store rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsStateStore {
    root: PathBuf,
    scheme: Arc<Scheme>,
}

impl FsStateStore {
    /// Create a store rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>, scheme: Arc<Scheme>) -> Self {
        Self {
            root: root.into(),
            scheme,
        }
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cluster_path(&self, name: &str) -> PathBuf {
        self.root.join(name).join(CLUSTER_FILE)
    }

    fn instance_group_dir(&self, cluster: &str) -> PathBuf {
        self.root.join(cluster).join(INSTANCE_GROUP_DIR)
    }

    async fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    async fn write(&self, path: &Path, object: Object) -> Result<()> {
        let data = self.scheme.encode(&object)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(parent, e))?;
        }
        tokio::fs::write(path, data)
            .await
            .map_err(|e| Error::io(path, e))?;
        debug!(kind = object.kind(), name = object.name(), path = %path.display(), "wrote object");
        Ok(())
    }

    fn decode_cluster(&self, path: &Path, data: &str) -> Result<Cluster> {
        match self.scheme.decode(data)? {
            Object::Cluster(c) => Ok(c),
            other => Err(Error::serialization_for_kind(
                "Cluster",
                format!("{} holds a {}, expected a Cluster", path.display(), other.kind()),
            )),
        }
    }

    fn decode_instance_group(&self, path: &Path, data: &str) -> Result<InstanceGroup> {
        match self.scheme.decode(data)? {
            Object::InstanceGroup(ig) => Ok(ig),
            other => Err(Error::serialization_for_kind(
                "InstanceGroup",
                format!(
                    "{} holds a {}, expected an InstanceGroup",
                    path.display(),
                    other.kind()
                ),
            )),
        }
    }

    async fn cluster_exists(&self, name: &str) -> Result<bool> {
        let path = self.cluster_path(name);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| Error::io(path, e))
    }
}

#[async_trait]
impl StateStore for FsStateStore {
    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>> {
        check_object_name("Cluster", name)?;
        let path = self.cluster_path(name);
        debug!(cluster = name, path = %path.display(), "reading cluster");

        match self.read_optional(&path).await? {
            Some(data) => self.decode_cluster(&path, &data).map(Some),
            None => Ok(None),
        }
    }

    async fn list_instance_groups(&self, cluster: &str) -> Result<Vec<InstanceGroup>> {
        check_object_name("Cluster", cluster)?;
        let dir = self.instance_group_dir(cluster);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&dir, e)),
        };

        let mut groups = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Error::io(&dir, e))? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(|e| Error::io(&path, e))?;
            if !file_type.is_file() {
                continue;
            }
            let data = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::io(&path, e))?;
            groups.push(self.decode_instance_group(&path, &data)?);
        }

        groups.sort_by(|a, b| a.name().cmp(b.name()));
        debug!(cluster, count = groups.len(), "listed instance groups");
        Ok(groups)
    }

    async fn create_cluster(&self, cluster: &Cluster) -> Result<()> {
        let name = cluster.name();
        check_object_name("Cluster", name)?;
        if self.cluster_exists(name).await? {
            return Err(Error::already_exists("Cluster", name));
        }
        self.write(&self.cluster_path(name), Object::Cluster(cluster.clone()))
            .await
    }

    async fn update_cluster(&self, cluster: &Cluster) -> Result<()> {
        let name = cluster.name();
        check_object_name("Cluster", name)?;
        if !self.cluster_exists(name).await? {
            return Err(Error::not_found("Cluster", name));
        }
        self.write(&self.cluster_path(name), Object::Cluster(cluster.clone()))
            .await
    }

    async fn put_instance_group(&self, cluster: &str, group: &InstanceGroup) -> Result<()> {
        check_object_name("Cluster", cluster)?;
        check_object_name("InstanceGroup", group.name())?;
        if !self.cluster_exists(cluster).await? {
            return Err(Error::not_found("Cluster", cluster));
        }
        let path = self.instance_group_dir(cluster).join(group.name());
        self.write(&path, Object::InstanceGroup(group.clone())).await
    }
}
