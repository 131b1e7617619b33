//! Cluster topology validation
//!
//! Decides whether a Cluster and its InstanceGroups describe a topology that
//! can be provisioned safely: distinct zones, both control plane and worker
//! roles present, every zone reference resolvable, and an etcd quorum that
//! can survive the loss of a zone.
//!
//! Validation is pure. It reads the snapshots it is given, never mutates
//! them, performs no I/O and keeps no state between calls.
//!
//! # Fail-fast and aggregate modes
//!
//! [`Validator::validate`] stops at the first violated invariant, in the
//! order of [`Check::ALL`]. Later checks may assume earlier ones hold, so
//! this is the mode the lifecycle commands use. [`Validator::validate_all`]
//! runs every active check and returns all violations; its output can
//! contain follow-on errors that fail-fast would have hidden.
//!
//! # Strictness
//!
//! A strict policy runs every check. The early policy, used before the
//! InstanceGroups have been authored, skips the checks that need the full
//! topology ([`Check::requires_full_topology`]): role coverage and etcd
//! quorum.

mod checks;
mod error;
mod region;

use std::collections::BTreeSet;

pub use checks::{
    etcd_quorum, master_zones, region_coherence, role_coverage, zone_membership,
    zone_uniqueness, Check,
};
pub use error::{ValidationError, ValidationErrorKind, ZoneOwner};
pub use region::RegionInference;

use crate::crd::{Cluster, InstanceGroup};

/// Which checks run, and how regions are inferred
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    checks: BTreeSet<Check>,
    regions: RegionInference,
}

impl ValidationPolicy {
    /// Every check active; for clusters whose InstanceGroups are all defined
    pub fn strict() -> Self {
        Self {
            checks: Check::ALL.into_iter().collect(),
            regions: RegionInference::default(),
        }
    }

    /// Only checks that hold for a partially authored topology
    pub fn early() -> Self {
        Self {
            checks: Check::ALL
                .into_iter()
                .filter(|c| !c.requires_full_topology())
                .collect(),
            regions: RegionInference::default(),
        }
    }

    /// [`strict`](Self::strict) or [`early`](Self::early)
    pub fn for_strictness(strict: bool) -> Self {
        if strict {
            Self::strict()
        } else {
            Self::early()
        }
    }

    /// Set the region inference used by the region coherence check
    pub fn with_region_inference(mut self, regions: RegionInference) -> Self {
        self.regions = regions;
        self
    }

    /// Disable a check
    pub fn without(mut self, check: Check) -> Self {
        self.checks.remove(&check);
        self
    }

    /// Enable a check
    pub fn with(mut self, check: Check) -> Self {
        self.checks.insert(check);
        self
    }

    /// Returns true if `check` runs under this policy
    pub fn is_active(&self, check: Check) -> bool {
        self.checks.contains(&check)
    }

    /// Active checks in execution order
    pub fn checks(&self) -> impl Iterator<Item = Check> + '_ {
        self.checks.iter().copied()
    }

    /// Region inference in effect
    pub fn region_inference(&self) -> RegionInference {
        self.regions
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::strict()
    }
}

/// Runs a [`ValidationPolicy`] against cluster snapshots
#[derive(Debug, Clone, Default)]
pub struct Validator {
    policy: ValidationPolicy,
}

impl Validator {
    /// Create a validator for the given policy
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    /// The policy this validator runs
    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Returns the first violated invariant, if any
    pub fn validate(
        &self,
        cluster: &Cluster,
        groups: &[InstanceGroup],
    ) -> Result<(), ValidationError> {
        match self.violations(cluster, groups).next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Returns every violated invariant, in check order
    pub fn validate_all(&self, cluster: &Cluster, groups: &[InstanceGroup]) -> Vec<ValidationError> {
        self.violations(cluster, groups).collect()
    }

    fn violations<'a>(
        &'a self,
        cluster: &'a Cluster,
        groups: &'a [InstanceGroup],
    ) -> impl Iterator<Item = ValidationError> + 'a {
        let regions = self.policy.regions;
        self.policy
            .checks()
            .filter_map(move |check| check.run(cluster, groups, regions))
    }
}

/// Validate a cluster and its groups, failing fast
///
/// `strict` selects [`ValidationPolicy::strict`] or
/// [`ValidationPolicy::early`].
pub fn validate(
    cluster: &Cluster,
    groups: &[InstanceGroup],
    strict: bool,
) -> Result<(), ValidationError> {
    Validator::new(ValidationPolicy::for_strictness(strict)).validate(cluster, groups)
}
