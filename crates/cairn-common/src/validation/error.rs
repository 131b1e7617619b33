//! Topology invariant violations

use std::fmt;

use thiserror::Error;

use crate::crd::InstanceGroupRole;

/// Broad category of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// A required entity is missing (no Master or Node group)
    Structural,
    /// Zones are duplicated, undeclared, unrecognized or span regions
    Topology,
    /// The master zone count cannot form an etcd majority
    Quorum,
}

/// Something that references a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneOwner {
    /// An InstanceGroup, by name
    InstanceGroup(String),
    /// A member of one of the cluster's etcd clusters
    EtcdMember {
        /// etcd cluster name
        cluster: String,
        /// Member name
        member: String,
    },
}

impl fmt::Display for ZoneOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstanceGroup(name) => write!(f, "InstanceGroup {name:?}"),
            Self::EtcdMember { cluster, member } => {
                write!(f, "etcd member {:?}", format!("{cluster}/{member}"))
            }
        }
    }
}

/// A violated topology invariant
///
/// Messages are stable; callers and users match on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The same zone name is declared twice on the cluster
    #[error("Zones contained a duplicate value: {zone}")]
    DuplicateZone {
        /// The repeated zone name
        zone: String,
    },

    /// No InstanceGroup has the given role
    #[error("must configure at least one {role} InstanceGroup")]
    MissingRole {
        /// The role nobody covers
        role: InstanceGroupRole,
    },

    /// A zone is referenced but not declared on the cluster
    #[error("{zone} is not configured as a Zone in the cluster (referenced by {owner})")]
    UnknownZone {
        /// The undeclared zone
        zone: String,
        /// What referenced it
        owner: ZoneOwner,
    },

    /// A Master or Node group spans no zones
    #[error("InstanceGroup {group:?} with role {role} must specify at least one zone")]
    NoZones {
        /// Group name
        group: String,
        /// Group role
        role: InstanceGroupRole,
    },

    /// A zone name does not follow the region naming convention
    #[error("Zone is not a recognized AZ: {zone}")]
    UnrecognizedZone {
        /// The zone that could not be mapped to a region
        zone: String,
    },

    /// Zones map to more than one region
    #[error("Clusters cannot span multiple regions: {}", regions.join(", "))]
    MixedRegion {
        /// Regions found, sorted
        regions: Vec<String>,
    },

    /// Masters span an even number of distinct zones
    #[error(
        "There should be an odd number of master-zones, for etcd's quorum.  \
         Hint: Use --zones and --master-zones to declare node zones and master zones separately. \
         Found {count} master-zones."
    )]
    EvenMasterQuorum {
        /// Distinct zones spanned by Master groups
        count: usize,
    },
}

impl ValidationError {
    /// Category of this violation
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            Self::MissingRole { .. } => ValidationErrorKind::Structural,
            Self::DuplicateZone { .. }
            | Self::UnknownZone { .. }
            | Self::NoZones { .. }
            | Self::UnrecognizedZone { .. }
            | Self::MixedRegion { .. } => ValidationErrorKind::Topology,
            Self::EvenMasterQuorum { .. } => ValidationErrorKind::Quorum,
        }
    }
}
