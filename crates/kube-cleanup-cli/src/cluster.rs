//! Cluster connection setup

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ClusterOptions {
    /// Explicit kubeconfig file; inferred when absent
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    /// Accept invalid server certificates
    pub insecure: bool,
}

async fn local_config(options: &ClusterOptions) -> Result<Option<Config>> {
    let kube_options = KubeConfigOptions {
        context: options.context.clone(),
        ..Default::default()
    };

    let config = match &options.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig: {:?}", path))?;
            Config::from_custom_kubeconfig(kubeconfig, &kube_options).await?
        }
        None if options.context.is_some() => Config::from_kubeconfig(&kube_options).await?,
        None => return Ok(None),
    };
    Ok(Some(config))
}

/// Resolve the client configuration, falling back to in-cluster credentials.
pub async fn connect(options: &ClusterOptions) -> Result<Client> {
    let mut config = match local_config(options).await {
        Ok(Some(config)) => {
            info!("Configured to run in out-of-cluster mode");
            config
        }
        Ok(None) => {
            let config = Config::infer()
                .await
                .context("Failed to infer cluster configuration")?;
            info!("Using inferred cluster configuration for {}", config.cluster_url);
            config
        }
        Err(e) => {
            warn!("Local configuration not usable ({:#}), trying in-cluster configuration", e);
            let config = Config::incluster().context("Failed to load in-cluster configuration")?;
            info!("Configured to run in in-cluster mode");
            config
        }
    };

    if options.insecure {
        warn!("TLS certificate verification is disabled");
        config.accept_invalid_certs = true;
    }

    Client::try_from(config).context("Failed to create Kubernetes client")
}
