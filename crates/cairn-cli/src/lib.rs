//! Cairn CLI library

pub mod commands;
pub mod config;
pub mod context;
pub mod error;

pub use error::{Error, Result};

use std::path::PathBuf;
use std::sync::Arc;

use cairn_common::scheme::Scheme;
use cairn_common::store::open_state_store;
use cairn_common::STATE_STORE_ENV;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;

use commands::create::CreateArgs;
use commands::edit::EditArgs;
use commands::update::UpdateArgs;
use commands::Command;
use config::CliConfig;
use context::{
    cluster_from_kube_context, process_args, Context, DefaultKubeContext, KubeContextSource,
};

/// Cairn - declarative Kubernetes cluster specifications
#[derive(Parser, Debug)]
#[command(name = "cairn")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (default is $HOME/.cairn.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Location of state storage
    #[arg(long, global = true, env = STATE_STORE_ENV)]
    pub state: Option<String>,

    /// Name of cluster
    #[arg(long, global = true)]
    pub name: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a cluster from a manifest file
    Create(CreateArgs),
    /// Edit a cluster specification in $EDITOR
    Edit(EditArgs),
    /// Validate a cluster and print its topology
    Update(UpdateArgs),
}

impl Commands {
    fn command(&self) -> &dyn Command {
        match self {
            Commands::Create(args) => args,
            Commands::Edit(args) => args,
            Commands::Update(args) => args,
        }
    }

    fn cluster_args(&self) -> &[String] {
        match self {
            Commands::Create(_) => &[],
            Commands::Edit(args) => &args.cluster,
            Commands::Update(args) => &args.cluster,
        }
    }

    /// Whether the command works on an existing cluster, so the current
    /// kubectl context may name it
    fn uses_kube_context(&self) -> bool {
        !matches!(self, Commands::Create(_))
    }
}

impl Cli {
    /// Log filter for the `-v` count, used when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        let ctx = self.context(&DefaultKubeContext)?;
        self.command.command().run(&ctx).await
    }

    /// Build the shared context: scheme, user config, cluster name and store
    pub fn context(&self, kube: &dyn KubeContextSource) -> Result<Context> {
        let scheme = Scheme::with_defaults()
            .map_err(|e| Error::command_failed(format!("initialization error: {}", e)))?;

        let loaded = config::load_config(self.config.as_deref())?;
        if let Some(path) = &loaded.path {
            eprintln!("Using config file: {}", path.display());
        }

        let name = self.resolve_cluster_name(&loaded.config, kube)?;
        let state = loaded
            .config
            .resolve_state(self.state.as_deref())
            .unwrap_or_default();
        debug!(state = %state, cluster = ?name, "opening state store");

        let scheme = Arc::new(scheme);
        let store = open_state_store(&state, Arc::clone(&scheme))?;
        Ok(Context::new(scheme, store, name))
    }

    fn resolve_cluster_name(
        &self,
        config: &CliConfig,
        kube: &dyn KubeContextSource,
    ) -> Result<Option<String>> {
        if let Some(name) = process_args(self.name.as_deref(), self.command.cluster_args())? {
            return Ok(Some(name));
        }
        if let Some(name) = config.resolve_name(None) {
            return Ok(Some(name));
        }
        if self.command.uses_kube_context() {
            return Ok(cluster_from_kube_context(kube));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use context::MockKubeContextSource;
    use kube::config::Kubeconfig;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: kind-dev
contexts:
  - name: kind-dev
    context:
      cluster: kube.example.com
      user: admin
clusters: []
users: []
"#;

    fn kube_with_cluster() -> MockKubeContextSource {
        let mut kube = MockKubeContextSource::new();
        kube.expect_load()
            .returning(|| Kubeconfig::from_yaml(KUBECONFIG));
        kube
    }

    fn kube_unused() -> MockKubeContextSource {
        let mut kube = MockKubeContextSource::new();
        kube.expect_load().never();
        kube
    }

    fn parse(args: &[&str], config: &tempfile::NamedTempFile) -> Cli {
        let config = config.path().to_string_lossy().into_owned();
        let mut argv = vec!["cairn", "--config", config.as_str()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn empty_config() -> tempfile::NamedTempFile {
        tempfile::NamedTempFile::new().unwrap()
    }

    #[test]
    fn verbosity_raises_the_log_filter() {
        let config = empty_config();
        assert_eq!(parse(&["update"], &config).log_filter(), "warn");
        assert_eq!(parse(&["-v", "update"], &config).log_filter(), "info");
        assert_eq!(parse(&["update", "-vv"], &config).log_filter(), "debug");
        assert_eq!(parse(&["-vvvv", "update"], &config).log_filter(), "trace");
    }

    #[test]
    fn positional_cluster_wins_without_consulting_kubectl() {
        let config = empty_config();
        let cli = parse(&["--state", "memory://", "update", "dev.example.com"], &config);
        let ctx = cli.context(&kube_unused()).unwrap();
        assert_eq!(ctx.cluster_name(), Some("dev.example.com"));
    }

    #[test]
    fn name_flag_and_positional_conflict() {
        let config = empty_config();
        let cli = parse(
            &["--state", "memory://", "--name", "a", "edit", "b"],
            &config,
        );
        let err = cli.context(&kube_unused()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot specify cluster via --name and positional argument"
        );
    }

    #[test]
    fn kubectl_context_is_the_last_resort() {
        let config = empty_config();
        let cli = parse(&["--state", "memory://", "update"], &config);
        let ctx = cli.context(&kube_with_cluster()).unwrap();
        assert_eq!(ctx.cluster_name(), Some("kube.example.com"));
    }

    #[test]
    fn create_does_not_use_kubectl_context() {
        let config = empty_config();
        let cli = parse(&["--state", "memory://", "create", "-f", "c.yaml"], &config);
        let ctx = cli.context(&kube_unused()).unwrap();
        assert_eq!(ctx.cluster_name(), None);
    }

    #[test]
    fn config_file_supplies_state_and_name() {
        use std::io::Write;
        let mut config = empty_config();
        writeln!(config, "state: memory://\nname: config.example.com").unwrap();

        let cli = parse(&["update"], &config);
        let ctx = cli.context(&kube_unused()).unwrap();
        assert_eq!(ctx.cluster_name(), Some("config.example.com"));
    }

    #[test]
    fn missing_state_store_is_reported() {
        let config = empty_config();
        let path = config.path().to_string_lossy().into_owned();
        let cli = Cli::try_parse_from([
            "cairn",
            "--config",
            path.as_str(),
            "--state",
            "",
            "update",
            "dev",
        ])
        .unwrap();
        let err = cli.context(&kube_unused()).unwrap_err();
        assert!(err.to_string().contains("--state is required"));
    }

    #[test]
    fn object_storage_is_rejected() {
        let config = empty_config();
        let cli = parse(&["--state", "s3://bucket", "update", "dev"], &config);
        let err = cli.context(&kube_unused()).unwrap_err();
        assert!(err.to_string().contains("s3://bucket"));
    }

    #[test]
    fn update_accepts_all_errors_flag() {
        let config = empty_config();
        let cli = parse(&["update", "--all-errors", "dev"], &config);
        match cli.command {
            Commands::Update(args) => {
                assert!(args.all_errors);
                assert_eq!(args.cluster, vec!["dev".to_string()]);
            }
            other => panic!("expected update, got {other:?}"),
        }
    }
}
