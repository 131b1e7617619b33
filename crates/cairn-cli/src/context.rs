//! Shared state for a single CLI invocation
//!
//! The [`Context`] is built once in [`Cli::run`](crate::Cli::run): it owns
//! the scheme, the opened state store and the resolved cluster name.
//!
//! The cluster name is resolved in this order:
//! 1. `--name` or a single positional argument (not both)
//! 2. `name` from the user config file
//! 3. The cluster of the current kubectl context

use std::sync::Arc;

use cairn_common::crd::{Cluster, InstanceGroup};
use cairn_common::scheme::Scheme;
use cairn_common::store::StateStore;
use kube::config::{Kubeconfig, KubeconfigError};
#[cfg(test)]
use mockall::automock;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Source of the current kubectl configuration
#[cfg_attr(test, automock)]
pub trait KubeContextSource: Send + Sync {
    /// Load the merged kubeconfig
    fn load(&self) -> std::result::Result<Kubeconfig, KubeconfigError>;
}

/// Reads `$KUBECONFIG` or `~/.kube/config`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKubeContext;

impl KubeContextSource for DefaultKubeContext {
    fn load(&self) -> std::result::Result<Kubeconfig, KubeconfigError> {
        Kubeconfig::read()
    }
}

/// Cluster named by the current kubectl context, if there is one
///
/// Every way this can fail is logged as a warning rather than returned;
/// the caller falls back to asking for `--name`.
pub fn cluster_from_kube_context(source: &dyn KubeContextSource) -> Option<String> {
    let config = match source.load() {
        Ok(config) => config,
        Err(e) => {
            warn!("error reading kubecfg: {}", e);
            return None;
        }
    };

    let current = match config.current_context.as_deref() {
        Some(current) if !current.is_empty() => current,
        _ => {
            warn!("no context set in kubecfg");
            return None;
        }
    };

    let Some(named) = config.contexts.iter().find(|c| c.name == current) else {
        warn!("context {:?} in kubecfg not found", current);
        return None;
    };

    match named.context.as_ref().map(|c| c.cluster.as_str()) {
        Some(cluster) if !cluster.is_empty() => {
            eprintln!("Using cluster from kubectl context: {}\n", cluster);
            Some(cluster.to_string())
        }
        _ => {
            warn!("context {:?} in kubecfg did not have a cluster", current);
            None
        }
    }
}

/// Combine `--name` with the positional arguments
///
/// Accepts no arguments, or a single `<clustername>` when `--name` is not
/// also given.
pub fn process_args(name_flag: Option<&str>, args: &[String]) -> Result<Option<String>> {
    let name_flag = name_flag.filter(|n| !n.is_empty());
    match args {
        [] => Ok(name_flag.map(str::to_string)),
        [name] => {
            if name_flag.is_some() {
                return Err(Error::usage(
                    "Cannot specify cluster via --name and positional argument",
                ));
            }
            Ok(Some(name.clone()))
        }
        _ => Err(Error::usage(
            "expected a single <clustername> to be passed as an argument",
        )),
    }
}

/// Everything a command needs to talk to the state store
pub struct Context {
    scheme: Arc<Scheme>,
    store: Box<dyn StateStore>,
    cluster_name: Option<String>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("scheme", &self.scheme)
            .field("cluster_name", &self.cluster_name)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(scheme: Arc<Scheme>, store: Box<dyn StateStore>, cluster_name: Option<String>) -> Self {
        Self {
            scheme,
            store,
            cluster_name: cluster_name.filter(|n| !n.is_empty()),
        }
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    /// Resolved cluster name, if any
    pub fn cluster_name(&self) -> Option<&str> {
        self.cluster_name.as_deref()
    }

    /// Fetch the named cluster from the state store
    pub async fn cluster(&self) -> Result<Cluster> {
        let name = self
            .cluster_name()
            .ok_or_else(|| Error::usage("--name is required"))?;

        debug!(cluster = name, "fetching cluster");
        let cluster = self.store.get_cluster(name).await.map_err(|e| {
            Error::command_failed(format!("error reading cluster configuration: {}", e))
        })?;
        let cluster =
            cluster.ok_or_else(|| Error::command_failed(format!("cluster {:?} not found", name)))?;

        if cluster.name() != name {
            return Err(Error::command_failed(format!(
                "cluster name did not match expected name: {} vs {}",
                name,
                cluster.name()
            )));
        }
        Ok(cluster)
    }

    /// InstanceGroups of a cluster, sorted by name
    pub async fn instance_groups(&self, cluster: &Cluster) -> Result<Vec<InstanceGroup>> {
        Ok(self.store.list_instance_groups(cluster.name()).await?)
    }
}
