//! `cairn create -f <file>`: store a new cluster from a manifest.
//!
//! The manifest is a multi-document YAML file holding exactly one Cluster
//! and any number of InstanceGroups:
//!
//! ```bash
//! cairn --state file:///var/lib/cairn create -f dev.example.com.yaml
//! ```
//!
//! With InstanceGroups present the full topology is validated. A bare
//! Cluster gets the early checks only, and `edit` keeps it that way until
//! groups are stored. Every object name is checked before the first write,
//! so a rejected manifest leaves nothing behind.

use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;
use cairn_common::crd::{Cluster, InstanceGroup};
use cairn_common::scheme::Object;
use cairn_common::store::check_object_name;
use cairn_common::validation;
use clap::Args;
use tracing::info;

use super::Command;
use crate::context::Context;
use crate::{Error, Result};

/// Create a cluster from a manifest file
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Manifest with one Cluster and its InstanceGroups
    #[arg(short = 'f', long = "filename")]
    pub filename: PathBuf,
}

/// The objects of a create manifest
#[derive(Debug)]
pub struct Manifest {
    pub cluster: Cluster,
    pub groups: Vec<InstanceGroup>,
}

impl Manifest {
    /// Split decoded objects into the single Cluster and its groups.
    pub fn from_objects(objects: Vec<Object>) -> Result<Self> {
        let mut clusters = Vec::new();
        let mut groups = Vec::new();
        for object in objects {
            match object {
                Object::Cluster(c) => clusters.push(c),
                Object::InstanceGroup(ig) => groups.push(ig),
            }
        }

        let cluster = match clusters.len() {
            0 => return Err(Error::command_failed("no Cluster found in manifest")),
            1 => clusters.remove(0),
            n => {
                return Err(Error::command_failed(format!(
                    "expected a single Cluster in manifest, found {}",
                    n
                )))
            }
        };
        Ok(Self { cluster, groups })
    }

    /// Check that every object can be stored and no group is defined twice.
    pub fn check_names(&self) -> Result<()> {
        check_object_name("Cluster", self.cluster.name())?;
        let mut seen = BTreeSet::new();
        for group in &self.groups {
            check_object_name("InstanceGroup", group.name())?;
            if !seen.insert(group.name()) {
                return Err(Error::command_failed(format!(
                    "InstanceGroup {} is defined more than once in manifest",
                    group.name()
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Command for CreateArgs {
    async fn run(&self, ctx: &Context) -> Result<()> {
        let data = tokio::fs::read_to_string(&self.filename)
            .await
            .map_err(|e| Error::read_file(&self.filename, e))?;
        let manifest = Manifest::from_objects(ctx.scheme().decode_all(&data)?)?;
        create_cluster(ctx, manifest).await
    }
}

/// Validate and store a cluster with its groups.
pub async fn create_cluster(ctx: &Context, manifest: Manifest) -> Result<()> {
    manifest.check_names()?;
    let Manifest { cluster, groups } = manifest;

    if let Some(expected) = ctx.cluster_name() {
        if expected != cluster.name() {
            return Err(Error::command_failed(format!(
                "cluster name did not match expected name: {} vs {}",
                expected,
                cluster.name()
            )));
        }
    }

    let strict = !groups.is_empty();
    validation::validate(&cluster, &groups, strict)?;

    let store = ctx.store();
    store.create_cluster(&cluster).await?;
    for group in &groups {
        store.put_instance_group(cluster.name(), group).await?;
    }

    info!(
        cluster = cluster.name(),
        groups = groups.len(),
        strict,
        "created cluster"
    );
    println!("Created cluster {}", cluster.name());
    Ok(())
}
