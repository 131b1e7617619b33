//! Individual topology invariants
//!
//! Each check is a pure function over a cluster snapshot and its groups and
//! reports at most one violation. Checks do not depend on each other, but
//! some only make sense once earlier ones pass; [`Check`] fixes the order.

use std::collections::{BTreeSet, HashSet};

use super::error::{ValidationError, ZoneOwner};
use super::region::RegionInference;
use crate::crd::{Cluster, InstanceGroup, InstanceGroupRole};

/// The known invariants, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Check {
    /// Zone names on the cluster are distinct
    ZoneUniqueness,
    /// At least one Master and one Node group exist
    RoleCoverage,
    /// Every referenced zone is declared on the cluster
    ZoneMembership,
    /// All zones map to one region
    RegionCoherence,
    /// Masters span an odd number of zones
    EtcdQuorum,
}

impl Check {
    /// Every check, in the order the validator runs them
    pub const ALL: [Check; 5] = [
        Check::ZoneUniqueness,
        Check::RoleCoverage,
        Check::ZoneMembership,
        Check::RegionCoherence,
        Check::EtcdQuorum,
    ];

    /// Returns true if the check needs every InstanceGroup to be defined
    pub fn requires_full_topology(&self) -> bool {
        matches!(self, Self::RoleCoverage | Self::EtcdQuorum)
    }

    /// Run this check
    pub fn run(
        &self,
        cluster: &Cluster,
        groups: &[InstanceGroup],
        regions: RegionInference,
    ) -> Option<ValidationError> {
        match self {
            Self::ZoneUniqueness => zone_uniqueness(cluster, groups),
            Self::RoleCoverage => role_coverage(cluster, groups),
            Self::ZoneMembership => zone_membership(cluster, groups),
            Self::RegionCoherence => region_coherence(cluster, groups, regions),
            Self::EtcdQuorum => etcd_quorum(cluster, groups),
        }
    }
}

/// Fails on the first zone name declared more than once
pub fn zone_uniqueness(cluster: &Cluster, _groups: &[InstanceGroup]) -> Option<ValidationError> {
    let mut seen = HashSet::new();
    cluster
        .spec
        .zone_names()
        .find(|zone| !seen.insert(*zone))
        .map(|zone| ValidationError::DuplicateZone {
            zone: zone.to_string(),
        })
}

/// Fails if no group is a Master, then if no group is a Node
pub fn role_coverage(_cluster: &Cluster, groups: &[InstanceGroup]) -> Option<ValidationError> {
    [InstanceGroupRole::Master, InstanceGroupRole::Node]
        .into_iter()
        .find(|role| !groups.iter().any(|g| g.role() == *role))
        .map(|role| ValidationError::MissingRole { role })
}

/// Fails on the first zone referenced by a group or etcd member that the
/// cluster does not declare, or on a Master/Node group with no zones
pub fn zone_membership(cluster: &Cluster, groups: &[InstanceGroup]) -> Option<ValidationError> {
    for group in groups {
        if group.spec.zones.is_empty() && group.role().requires_zones() {
            return Some(ValidationError::NoZones {
                group: group.name().to_string(),
                role: group.role(),
            });
        }
        if let Some(zone) = group.zones().find(|z| !cluster.spec.has_zone(z)) {
            return Some(ValidationError::UnknownZone {
                zone: zone.to_string(),
                owner: ZoneOwner::InstanceGroup(group.name().to_string()),
            });
        }
    }

    for etcd in &cluster.spec.etcd_clusters {
        for member in &etcd.members {
            let Some(zone) = member.zone.as_deref() else {
                continue;
            };
            if !cluster.spec.has_zone(zone) {
                return Some(ValidationError::UnknownZone {
                    zone: zone.to_string(),
                    owner: ZoneOwner::EtcdMember {
                        cluster: etcd.name.clone(),
                        member: member.name.clone(),
                    },
                });
            }
        }
    }

    None
}

/// Fails if any zone cannot be mapped to a region or zones span several
/// regions. Passes unconditionally when inference is disabled.
pub fn region_coherence(
    cluster: &Cluster,
    groups: &[InstanceGroup],
    regions: RegionInference,
) -> Option<ValidationError> {
    if !regions.is_enabled() {
        return None;
    }

    let zones = cluster
        .spec
        .zone_names()
        .chain(groups.iter().flat_map(InstanceGroup::zones));

    let mut found = BTreeSet::new();
    for zone in zones {
        match regions.region_of(zone) {
            Some(region) => {
                found.insert(region);
            }
            None => {
                return Some(ValidationError::UnrecognizedZone {
                    zone: zone.to_string(),
                })
            }
        }
    }

    if found.len() > 1 {
        return Some(ValidationError::MixedRegion {
            regions: found.into_iter().map(str::to_string).collect(),
        });
    }
    None
}

/// Distinct zones spanned by all Master groups combined
pub fn master_zones(groups: &[InstanceGroup]) -> BTreeSet<&str> {
    groups
        .iter()
        .filter(|g| g.is_master())
        .flat_map(InstanceGroup::zones)
        .collect()
}

/// Fails if Masters span an even, non-zero number of distinct zones
pub fn etcd_quorum(_cluster: &Cluster, groups: &[InstanceGroup]) -> Option<ValidationError> {
    let count = master_zones(groups).len();
    if count > 0 && count.is_multiple_of(2) {
        return Some(ValidationError::EvenMasterQuorum { count });
    }
    None
}
