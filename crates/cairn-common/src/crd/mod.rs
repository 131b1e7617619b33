//! Custom Resource Definitions for Cairn
//!
//! Clusters and their InstanceGroups are modelled as Kubernetes-style
//! resources so they serialize to familiar `apiVersion`/`kind` manifests.

mod cluster;
mod instance_group;

pub use cluster::{Cluster, ClusterSpec, ClusterZoneSpec, EtcdClusterSpec, EtcdMemberSpec};
pub use instance_group::{InstanceGroup, InstanceGroupRole, InstanceGroupSpec};
