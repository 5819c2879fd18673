//! Library interface for the kube-cleanup command line

pub mod cluster;
pub mod progress;
pub mod report;

use anyhow::{Context, Result};
use clap::Args;
use kube_cleanup_core::{
    Check, Engine, EngineOptions, Inventory, KubeAccessor, ResourceAccessor, RetentionPolicy,
    RunObserver, SnapshotAccessor, DEFAULT_SYSTEM_NAMESPACE,
};
use std::path::PathBuf;
use tracing::info;

use crate::cluster::ClusterOptions;
use crate::report::{OutputFormat, Report};

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Path to the kubeconfig file (defaults to $KUBECONFIG or ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, env = "KUBE_CONTEXT")]
    pub context: Option<String>,

    /// Do not verify the API server's TLS certificate
    #[arg(long)]
    pub insecure_skip_tls_verify: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub output: OutputFormat,

    /// Only inspect this namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Checks to run (namespaces, ingresses, services, deployments, pods)
    #[arg(long, value_delimiter = ',')]
    pub checks: Vec<Check>,

    /// Namespace whose pods are never checked for ownership
    #[arg(long, default_value = DEFAULT_SYSTEM_NAMESPACE)]
    pub system_namespace: String,

    /// Keep only the most recent finding per resource
    #[arg(long)]
    pub latest_only: bool,

    /// Analyze resources from manifest files instead of a live cluster
    #[arg(short = 'f', long = "from-file")]
    pub from_files: Vec<PathBuf>,

    /// Exit with status 1 when anything is reported
    #[arg(long)]
    pub fail_on_findings: bool,

    /// Never draw progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl ListArgs {
    pub fn engine_options(&self) -> EngineOptions {
        let checks = if self.checks.is_empty() {
            Check::ALL.to_vec()
        } else {
            let mut checks = self.checks.clone();
            checks.sort();
            checks.dedup();
            checks
        };

        EngineOptions {
            namespace: self.namespace.clone(),
            system_namespace: self.system_namespace.clone(),
            retention: if self.latest_only {
                RetentionPolicy::LatestOnly
            } else {
                RetentionPolicy::KeepAll
            },
            checks,
        }
    }

    pub fn cluster_options(&self) -> ClusterOptions {
        ClusterOptions {
            kubeconfig: self.kubeconfig.clone(),
            context: self.context.clone(),
            insecure: self.insecure_skip_tls_verify,
        }
    }
}

/// Load every manifest into one snapshot
pub fn load_snapshot(paths: &[PathBuf]) -> Result<SnapshotAccessor> {
    let mut snapshot = SnapshotAccessor::new();
    for path in paths {
        let added = snapshot
            .load_file(path)
            .with_context(|| format!("Failed to load snapshot: {:?}", path))?;
        info!("Loaded {} resources from {:?}", added, path);
    }
    Ok(snapshot)
}

pub async fn validate<A>(
    accessor: &A,
    options: EngineOptions,
    observer: &mut dyn RunObserver,
) -> Result<Inventory>
where
    A: ResourceAccessor + ?Sized,
{
    let inventory = Engine::with_options(accessor, options)
        .run(observer)
        .await
        .context("Validation aborted")?;
    Ok(inventory)
}

/// Run the `list` command up to the assembled report
pub async fn run_list(args: &ListArgs, observer: &mut dyn RunObserver) -> Result<Report> {
    let options = args.engine_options();

    let inventory = if args.from_files.is_empty() {
        let client = cluster::connect(&args.cluster_options()).await?;
        info!("Starting kube-cleanup");
        validate(&KubeAccessor::new(client), options, observer).await?
    } else {
        let snapshot = load_snapshot(&args.from_files)?;
        validate(&snapshot, options, observer).await?
    };

    Ok(Report::from(inventory))
}
