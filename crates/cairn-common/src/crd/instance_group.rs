//! InstanceGroup Custom Resource Definition
//!
//! An InstanceGroup is a homogeneous set of machines with a single role,
//! spread across one or more of the cluster's zones.

use std::fmt;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Role of the machines in an InstanceGroup
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum InstanceGroupRole {
    /// Control plane machines (run the API server and etcd)
    Master,
    /// Worker machines
    #[default]
    Node,
    /// SSH jump hosts
    Bastion,
}

impl fmt::Display for InstanceGroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Master => write!(f, "Master"),
            Self::Node => write!(f, "Node"),
            Self::Bastion => write!(f, "Bastion"),
        }
    }
}

impl InstanceGroupRole {
    /// Whether groups with this role must declare at least one zone
    pub fn requires_zones(&self) -> bool {
        matches!(self, Self::Master | Self::Node)
    }
}

/// Specification for an InstanceGroup
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "cairn.dev",
    version = "v1alpha1",
    kind = "InstanceGroup",
    plural = "instancegroups",
    shortname = "ig",
    namespaced = false,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroupSpec {
    /// Role of the machines in this group
    pub role: InstanceGroupRole,

    /// Zones this group spans
    #[serde(default)]
    pub zones: Vec<String>,

    /// Machine type (e.g. "m5.large")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,

    /// Minimum number of machines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u32>,

    /// Maximum number of machines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u32>,
}

impl InstanceGroupSpec {
    /// Create a spec with the given role spanning `zones`
    pub fn new<I, S>(role: InstanceGroupRole, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role,
            zones: zones.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

impl InstanceGroup {
    /// Group name from metadata, empty if unset
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Role of this group
    pub fn role(&self) -> InstanceGroupRole {
        self.spec.role
    }

    /// Returns true if this group runs control plane machines
    pub fn is_master(&self) -> bool {
        self.spec.role == InstanceGroupRole::Master
    }

    /// Zones this group spans, in declaration order
    pub fn zones(&self) -> impl Iterator<Item = &str> {
        self.spec.zones.iter().map(String::as_str)
    }
}
