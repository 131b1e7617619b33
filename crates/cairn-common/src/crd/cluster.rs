//! Cluster Custom Resource Definition
//!
//! A Cluster is the declarative specification of a Kubernetes cluster: the
//! availability zones it may use, its etcd topology, and provider settings
//! that Cairn passes through untouched.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Specification for a Cluster
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "cairn.dev",
    version = "v1alpha1",
    kind = "Cluster",
    plural = "clusters",
    namespaced = false,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Availability zones the cluster may place machines in
    ///
    /// Order is preserved. Names are expected to be unique but the list
    /// itself does not enforce it; the topology validator does.
    #[serde(default)]
    pub zones: Vec<ClusterZoneSpec>,

    /// etcd clusters backing the control plane
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub etcd_clusters: Vec<EtcdClusterSpec>,

    /// Cloud provider identifier (aws, gce, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider: Option<String>,

    /// Kubernetes version to deploy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,

    /// CIDR for the cluster network
    #[serde(
        rename = "networkCIDR",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub network_cidr: Option<String>,

    /// DNS name of the API server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_public_name: Option<String>,
}

/// An availability zone declared on the cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterZoneSpec {
    /// Zone name (e.g. "us-east-1a")
    pub name: String,

    /// Subnet CIDR for the zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
}

impl ClusterZoneSpec {
    /// Create a zone with the given name and CIDR
    pub fn new(name: impl Into<String>, cidr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cidr: Some(cidr.into()),
        }
    }
}

/// One etcd cluster definition
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EtcdClusterSpec {
    /// Identifier, e.g. "main" or "events"
    pub name: String,

    /// Members of this etcd cluster
    #[serde(default)]
    pub members: Vec<EtcdMemberSpec>,
}

/// A single etcd member
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EtcdMemberSpec {
    /// Member name
    pub name: String,

    /// Zone the member runs in, when pinned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl EtcdMemberSpec {
    /// Create a member pinned to a zone
    pub fn in_zone(name: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zone: Some(zone.into()),
        }
    }
}

impl ClusterSpec {
    /// Declared zone names in declaration order
    pub fn zone_names(&self) -> impl Iterator<Item = &str> {
        self.zones.iter().map(|z| z.name.as_str())
    }

    /// Returns true if `zone` is declared on the cluster
    pub fn has_zone(&self, zone: &str) -> bool {
        self.zones.iter().any(|z| z.name == zone)
    }
}

impl Cluster {
    /// Cluster name from metadata, empty if unset
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_cluster_manifest_parses_with_defaults() {
        let yaml = r#"
apiVersion: cairn.dev/v1alpha1
kind: Cluster
metadata:
  name: prod.example.com
spec:
  cloudProvider: aws
  networkCIDR: 172.20.0.0/16
  zones:
    - name: us-east-1a
      cidr: 172.20.32.0/19
    - name: us-east-1b
      cidr: 172.20.64.0/19
"#;
        let cluster: Cluster = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(cluster.name(), "prod.example.com");
        assert_eq!(cluster.spec.cloud_provider.as_deref(), Some("aws"));
        assert_eq!(cluster.spec.network_cidr.as_deref(), Some("172.20.0.0/16"));
        assert_eq!(
            cluster.spec.zone_names().collect::<Vec<_>>(),
            vec!["us-east-1a", "us-east-1b"]
        );
        assert!(cluster.spec.etcd_clusters.is_empty());
    }

    #[test]
    fn story_missing_zones_become_empty_list() {
        let yaml = r#"
apiVersion: cairn.dev/v1alpha1
kind: Cluster
metadata:
  name: bare
spec: {}
"#;
        let cluster: Cluster = serde_yaml::from_str(yaml).unwrap();
        assert!(cluster.spec.zones.is_empty());
        assert!(!cluster.spec.has_zone("us-east-1a"));
    }

    #[test]
    fn etcd_member_zone_is_optional() {
        let yaml = r#"
name: main
members:
  - name: a
    zone: us-east-1a
  - name: b
"#;
        let etcd: EtcdClusterSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(etcd.members[0].zone.as_deref(), Some("us-east-1a"));
        assert_eq!(etcd.members[1].zone, None);
    }

    #[test]
    fn snapshots_compare_by_value() {
        let spec = ClusterSpec {
            zones: vec![ClusterZoneSpec::new("a", "10.0.1.0/24")],
            ..Default::default()
        };
        let a = Cluster::new("c", spec.clone());
        let b = Cluster::new("c", spec);
        assert_eq!(a, b);
    }
}
