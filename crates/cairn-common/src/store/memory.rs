//! In-memory state store

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{check_object_name, StateStore};
use crate::crd::{Cluster, InstanceGroup};
use crate::{Error, Result};

#[derive(Debug)]
struct StoredCluster {
    cluster: Cluster,
    groups: BTreeMap<String, InstanceGroup>,
}

/// State store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    clusters: RwLock<BTreeMap<String, StoredCluster>>,
}

impl MemoryStateStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>> {
        check_object_name("Cluster", name)?;
        let clusters = self.clusters.read().await;
        Ok(clusters.get(name).map(|s| s.cluster.clone()))
    }

    async fn list_instance_groups(&self, cluster: &str) -> Result<Vec<InstanceGroup>> {
        check_object_name("Cluster", cluster)?;
        let clusters = self.clusters.read().await;
        Ok(clusters
            .get(cluster)
            .map(|s| s.groups.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn create_cluster(&self, cluster: &Cluster) -> Result<()> {
        let name = cluster.name();
        check_object_name("Cluster", name)?;
        let mut clusters = self.clusters.write().await;
        if clusters.contains_key(name) {
            return Err(Error::already_exists("Cluster", name));
        }
        clusters.insert(
            name.to_string(),
            StoredCluster {
                cluster: cluster.clone(),
                groups: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn update_cluster(&self, cluster: &Cluster) -> Result<()> {
        let name = cluster.name();
        check_object_name("Cluster", name)?;
        let mut clusters = self.clusters.write().await;
        let stored = clusters
            .get_mut(name)
            .ok_or_else(|| Error::not_found("Cluster", name))?;
        stored.cluster = cluster.clone();
        Ok(())
    }

    async fn put_instance_group(&self, cluster: &str, group: &InstanceGroup) -> Result<()> {
        check_object_name("Cluster", cluster)?;
        check_object_name("InstanceGroup", group.name())?;
        let mut clusters = self.clusters.write().await;
        let stored = clusters
            .get_mut(cluster)
            .ok_or_else(|| Error::not_found("Cluster", cluster))?;
        stored
            .groups
            .insert(group.name().to_string(), group.clone());
        Ok(())
    }
}
