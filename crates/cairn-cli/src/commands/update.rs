//! `cairn update [<cluster>]`: validate a stored cluster and show its plan.
//!
//! Runs every topology check against the stored Cluster and InstanceGroups.
//! By default the first violation is reported; `--all-errors` reports all of
//! them. A valid cluster prints the topology it would be provisioned with.

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use cairn_common::crd::{Cluster, InstanceGroup, InstanceGroupRole};
use cairn_common::validation::{master_zones, ValidationPolicy, Validator};
use clap::Args;
use tracing::info;

use super::{join_or_dash, Command};
use crate::context::Context;
use crate::{Error, Result};

/// Validate a cluster and print its topology
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Cluster to update (alternative to --name)
    pub cluster: Vec<String>,

    /// Report every violation instead of stopping at the first
    #[arg(long)]
    pub all_errors: bool,
}

#[async_trait]
impl Command for UpdateArgs {
    async fn run(&self, ctx: &Context) -> Result<()> {
        let cluster = ctx.cluster().await?;
        let groups = ctx.instance_groups(&cluster).await?;
        let plan = plan_update(&cluster, &groups, self.all_errors)?;
        print!("{}", plan);
        Ok(())
    }
}

/// Validate strictly and build the plan for a valid topology.
pub fn plan_update<'a>(
    cluster: &'a Cluster,
    groups: &'a [InstanceGroup],
    all_errors: bool,
) -> Result<TopologyPlan<'a>> {
    let validator = Validator::new(ValidationPolicy::strict());
    if all_errors {
        let violations = validator.validate_all(cluster, groups);
        if !violations.is_empty() {
            return Err(Error::InvalidAll(violations));
        }
    } else {
        validator.validate(cluster, groups)?;
    }

    let plan = TopologyPlan::new(cluster, groups);
    info!(
        cluster = plan.cluster,
        master_zones = plan.master_zones.len(),
        groups = groups.len(),
        "cluster topology is valid"
    );
    Ok(plan)
}

/// The topology a valid cluster will be provisioned with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyPlan<'a> {
    pub cluster: &'a str,
    pub zones: Vec<&'a str>,
    pub master_zones: BTreeSet<&'a str>,
    pub node_zones: BTreeSet<&'a str>,
    pub groups: Vec<(&'a str, InstanceGroupRole, Vec<&'a str>)>,
    pub etcd_clusters: Vec<(&'a str, Vec<String>)>,
}

impl<'a> TopologyPlan<'a> {
    pub fn new(cluster: &'a Cluster, groups: &'a [InstanceGroup]) -> Self {
        let node_zones = groups
            .iter()
            .filter(|g| g.role() == InstanceGroupRole::Node)
            .flat_map(|g| g.zones())
            .collect();

        let etcd_clusters = cluster
            .spec
            .etcd_clusters
            .iter()
            .map(|etcd| {
                let members = etcd
                    .members
                    .iter()
                    .map(|m| match &m.zone {
                        Some(zone) => format!("{} ({})", m.name, zone),
                        None => m.name.clone(),
                    })
                    .collect();
                (etcd.name.as_str(), members)
            })
            .collect();

        Self {
            cluster: cluster.name(),
            zones: cluster.spec.zone_names().collect(),
            master_zones: master_zones(groups),
            node_zones,
            groups: groups
                .iter()
                .map(|g| (g.name(), g.role(), g.zones().collect()))
                .collect(),
            etcd_clusters,
        }
    }
}

impl fmt::Display for TopologyPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cluster {} is valid", self.cluster)?;
        writeln!(f)?;
        writeln!(f, "Zones:          {}", join_or_dash(self.zones.iter().copied()))?;
        writeln!(
            f,
            "Master zones:   {}",
            join_or_dash(self.master_zones.iter().copied())
        )?;
        writeln!(
            f,
            "Node zones:     {}",
            join_or_dash(self.node_zones.iter().copied())
        )?;

        if !self.groups.is_empty() {
            writeln!(f)?;
            writeln!(f, "InstanceGroups:")?;
            let width = self.groups.iter().map(|(n, _, _)| n.len()).max().unwrap_or(0);
            for (name, role, zones) in &self.groups {
                writeln!(
                    f,
                    "  {:<width$}  {:<7}  {}",
                    name,
                    role.to_string(),
                    join_or_dash(zones.iter().copied()),
                    width = width
                )?;
            }
        }

        if !self.etcd_clusters.is_empty() {
            writeln!(f)?;
            writeln!(f, "etcd clusters:")?;
            for (name, members) in &self.etcd_clusters {
                writeln!(
                    f,
                    "  {}: {}",
                    name,
                    join_or_dash(members.iter().map(String::as_str))
                )?;
            }
        }
        Ok(())
    }
}
