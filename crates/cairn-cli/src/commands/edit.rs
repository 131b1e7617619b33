//! `cairn edit [<cluster>]`: edit a stored cluster in `$EDITOR`.
//!
//! The edited document must still be a Cluster with the same name, and the
//! result is validated against the stored InstanceGroups before it is saved.
//! A cluster with no stored groups gets the early checks only.

use std::io::Write;
use std::process::Command as Process;

use async_trait::async_trait;
use cairn_common::scheme::Object;
use cairn_common::validation;
use clap::Args;
#[cfg(test)]
use mockall::automock;
use tracing::{debug, info};

use super::Command;
use crate::context::Context;
use crate::{Error, Result};

const DEFAULT_EDITOR: &str = "vi";

/// Edit a cluster specification
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Cluster to edit (alternative to --name)
    pub cluster: Vec<String>,
}

/// Something that lets a user change a document
#[cfg_attr(test, automock)]
pub trait Editor: Send + Sync {
    /// Return the edited form of `original`
    fn edit(&self, original: &str) -> Result<String>;
}

/// Runs `$EDITOR` (default `vi`) on a temporary file
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Editor from `$EDITOR`, falling back to `vi`
    pub fn from_env() -> Self {
        let command = std::env::var("EDITOR")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
        Self::new(command)
    }
}

impl Editor for ExternalEditor {
    fn edit(&self, original: &str) -> Result<String> {
        let mut file = tempfile::Builder::new()
            .prefix("cairn-edit-")
            .suffix(".yaml")
            .tempfile()
            .map_err(|e| Error::command_failed(format!("failed to create temp file: {}", e)))?;
        file.write_all(original.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| Error::command_failed(format!("failed to write temp file: {}", e)))?;

        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| Error::command_failed("no editor configured"))?;
        debug!(editor = %self.command, path = %file.path().display(), "launching editor");

        let status = Process::new(program)
            .args(parts)
            .arg(file.path())
            .status()
            .map_err(|e| Error::command_failed(format!("failed to run {}: {}", program, e)))?;
        if !status.success() {
            return Err(Error::command_failed(format!(
                "editor {} exited with {}",
                program, status
            )));
        }

        std::fs::read_to_string(file.path()).map_err(|e| Error::read_file(file.path(), e))
    }
}

/// What an edit session did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Unchanged,
    Saved,
}

#[async_trait]
impl Command for EditArgs {
    async fn run(&self, ctx: &Context) -> Result<()> {
        match edit_cluster(ctx, &ExternalEditor::from_env()).await? {
            EditOutcome::Unchanged => println!("Edit cancelled, no changes made."),
            EditOutcome::Saved => {}
        }
        Ok(())
    }
}

/// Fetch, edit, validate and save the context's cluster.
pub async fn edit_cluster(ctx: &Context, editor: &dyn Editor) -> Result<EditOutcome> {
    let cluster = ctx.cluster().await?;
    let groups = ctx.instance_groups(&cluster).await?;

    let original = ctx.scheme().encode(&Object::Cluster(cluster.clone()))?;
    let edited = editor.edit(&original)?;
    if edited.trim() == original.trim() {
        return Ok(EditOutcome::Unchanged);
    }

    let updated = match ctx.scheme().decode(&edited)? {
        Object::Cluster(c) => c,
        other => {
            return Err(Error::command_failed(format!(
                "edited document must be a Cluster, found {}",
                other.kind()
            )))
        }
    };
    if updated.name() != cluster.name() {
        return Err(Error::command_failed(format!(
            "cannot rename cluster: {} vs {}",
            cluster.name(),
            updated.name()
        )));
    }
    if updated == cluster {
        return Ok(EditOutcome::Unchanged);
    }

    let strict = !groups.is_empty();
    validation::validate(&updated, &groups, strict)?;
    ctx.store().update_cluster(&updated).await?;
    info!(cluster = updated.name(), strict, "updated cluster");
    Ok(EditOutcome::Saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_common::crd::{
        Cluster, ClusterSpec, ClusterZoneSpec, InstanceGroup, InstanceGroupRole,
        InstanceGroupSpec,
    };
    use cairn_common::scheme::Scheme;
    use cairn_common::store::{MemoryStateStore, StateStore};
    use std::sync::Arc;

    const NAME: &str = "dev.example.com";

    async fn stored_context() -> Context {
        let store = MemoryStateStore::new();
        store
            .create_cluster(&Cluster::new(
                NAME,
                ClusterSpec {
                    zones: vec![
                        ClusterZoneSpec::new("us-east-1a", "172.20.32.0/19"),
                        ClusterZoneSpec::new("us-east-1b", "172.20.64.0/19"),
                    ],
                    ..Default::default()
                },
            ))
            .await
            .unwrap();
        for (name, role) in [
            ("master-us-east-1a", InstanceGroupRole::Master),
            ("nodes", InstanceGroupRole::Node),
        ] {
            store
                .put_instance_group(
                    NAME,
                    &InstanceGroup::new(name, InstanceGroupSpec::new(role, ["us-east-1a"])),
                )
                .await
                .unwrap();
        }
        Context::new(
            Arc::new(Scheme::with_defaults().unwrap()),
            Box::new(store),
            Some(NAME.to_string()),
        )
    }

    async fn bare_context() -> Context {
        let store = MemoryStateStore::new();
        store
            .create_cluster(&Cluster::new(
                NAME,
                ClusterSpec {
                    zones: vec![ClusterZoneSpec::new("us-east-1a", "172.20.32.0/19")],
                    ..Default::default()
                },
            ))
            .await
            .unwrap();
        Context::new(
            Arc::new(Scheme::with_defaults().unwrap()),
            Box::new(store),
            Some(NAME.to_string()),
        )
    }

    fn editor_replacing(from: &'static str, to: &'static str) -> MockEditor {
        let mut editor = MockEditor::new();
        editor
            .expect_edit()
            .times(1)
            .returning(move |doc| Ok(doc.replace(from, to)));
        editor
    }

    /// Story: Adding a setting in the editor saves the cluster
    #[tokio::test]
    async fn story_edit_saves_valid_changes() {
        let ctx = stored_context().await;
        let editor = editor_replacing("spec:\n", "spec:\n  kubernetesVersion: 1.32.0\n");

        assert_eq!(
            edit_cluster(&ctx, &editor).await.unwrap(),
            EditOutcome::Saved
        );
        let cluster = ctx.cluster().await.unwrap();
        assert_eq!(cluster.spec.kubernetes_version.as_deref(), Some("1.32.0"));
    }

    /// Story: A cluster created without groups can still be edited
    #[tokio::test]
    async fn story_bare_cluster_edit_uses_early_checks() {
        let ctx = bare_context().await;
        let editor = editor_replacing("spec:\n", "spec:\n  kubernetesVersion: 1.32.0\n");

        assert_eq!(
            edit_cluster(&ctx, &editor).await.unwrap(),
            EditOutcome::Saved
        );
        let cluster = ctx.cluster().await.unwrap();
        assert_eq!(cluster.spec.kubernetes_version.as_deref(), Some("1.32.0"));
    }

    #[tokio::test]
    async fn bare_cluster_edit_still_rejects_duplicate_zones() {
        let ctx = bare_context().await;
        let mut editor = MockEditor::new();
        editor.expect_edit().times(1).returning(|doc| {
            let scheme = Scheme::with_defaults().unwrap();
            let Object::Cluster(mut cluster) = scheme.decode(doc).unwrap() else {
                panic!("expected a Cluster document");
            };
            cluster
                .spec
                .zones
                .push(ClusterZoneSpec::new("us-east-1a", "172.20.64.0/19"));
            Ok(scheme.encode(&Object::Cluster(cluster)).unwrap())
        });

        let err = edit_cluster(&ctx, &editor).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Zones contained a duplicate value: us-east-1a"
        );
    }

    #[tokio::test]
    async fn unchanged_document_is_a_no_op() {
        let ctx = stored_context().await;
        let mut editor = MockEditor::new();
        editor
            .expect_edit()
            .returning(|doc| Ok(format!("{}\n\n", doc)));

        assert_eq!(
            edit_cluster(&ctx, &editor).await.unwrap(),
            EditOutcome::Unchanged
        );
    }

    #[tokio::test]
    async fn renames_are_rejected() {
        let ctx = stored_context().await;
        let editor = editor_replacing("name: dev.example.com", "name: prod.example.com");

        let err = edit_cluster(&ctx, &editor).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot rename cluster: dev.example.com vs prod.example.com"
        );
    }

    #[tokio::test]
    async fn removing_a_used_zone_fails_validation() {
        let ctx = stored_context().await;
        let editor = editor_replacing("us-east-1a", "us-east-1c");

        let err = edit_cluster(&ctx, &editor).await.unwrap_err();
        assert!(err.is_invalid());
        assert!(err
            .to_string()
            .contains("us-east-1a is not configured as a Zone in the cluster"));

        let stored = ctx.cluster().await.unwrap();
        assert!(stored.spec.has_zone("us-east-1a"));
    }

    #[tokio::test]
    async fn editor_failures_propagate() {
        let ctx = stored_context().await;
        let mut editor = MockEditor::new();
        editor
            .expect_edit()
            .returning(|_| Err(Error::command_failed("editor vi exited with 1")));

        let err = edit_cluster(&ctx, &editor).await.unwrap_err();
        assert_eq!(err.to_string(), "editor vi exited with 1");
    }

    #[tokio::test]
    async fn edit_requires_a_cluster_name() {
        let ctx = Context::new(
            Arc::new(Scheme::with_defaults().unwrap()),
            Box::new(MemoryStateStore::new()),
            None,
        );
        let editor = MockEditor::new();
        let err = edit_cluster(&ctx, &editor).await.unwrap_err();
        assert_eq!(err.to_string(), "--name is required");
    }

    #[test]
    fn external_editor_runs_the_configured_command() {
        // `true` leaves the file alone, so the document comes back unchanged
        let editor = ExternalEditor::new("true");
        assert_eq!(editor.edit("kind: Cluster\n").unwrap(), "kind: Cluster\n");

        let err = ExternalEditor::new("false").edit("x").unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }
}
