//! Validation runs
//!
//! The engine lists one resource kind at a time, hands each resource to its
//! validator and collects the findings into an [`Inventory`]. Resources are
//! processed strictly one after another; nothing is retried.

use crate::accessor::ResourceAccessor;
use crate::error::{AccessError, EngineError};
use crate::inventory::{Inventory, RetentionPolicy};
use crate::model::SubjectKind;
use crate::validators;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Namespace whose pods are never checked for ownership
pub const DEFAULT_SYSTEM_NAMESPACE: &str = "kube-system";

/// One validation entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Check {
    Namespaces,
    Ingresses,
    Services,
    Deployments,
    Pods,
}

impl Check {
    pub const ALL: [Check; 5] = [
        Check::Namespaces,
        Check::Ingresses,
        Check::Services,
        Check::Deployments,
        Check::Pods,
    ];

    pub fn subject(&self) -> SubjectKind {
        match self {
            Check::Namespaces => SubjectKind::Namespace,
            Check::Ingresses => SubjectKind::Ingress,
            Check::Services => SubjectKind::Service,
            Check::Deployments => SubjectKind::Deployment,
            Check::Pods => SubjectKind::Pod,
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subject().plural())
    }
}

impl FromStr for Check {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "namespaces" | "namespace" | "ns" => Ok(Check::Namespaces),
            "ingresses" | "ingress" | "ing" => Ok(Check::Ingresses),
            "services" | "service" | "svc" => Ok(Check::Services),
            "deployments" | "deployment" | "deploy" => Ok(Check::Deployments),
            "pods" | "pod" | "po" => Ok(Check::Pods),
            other => Err(format!("unknown check: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Restrict every listing to this namespace
    pub namespace: Option<String>,
    pub system_namespace: String,
    pub retention: RetentionPolicy,
    /// Checks performed by [`Engine::run`], in order
    pub checks: Vec<Check>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            system_namespace: DEFAULT_SYSTEM_NAMESPACE.to_string(),
            retention: RetentionPolicy::default(),
            checks: Check::ALL.to_vec(),
        }
    }
}

/// Receives progress notifications during a run
pub trait RunObserver {
    fn phase_started(&mut self, _check: Check, _total: usize) {}
    fn resource_done(&mut self, _check: Check) {}
    fn phase_finished(&mut self, _check: Check, _findings: usize) {}
}

/// Observer that ignores every notification
pub struct Silent;

impl RunObserver for Silent {}

pub struct Engine<'a, A: ?Sized> {
    accessor: &'a A,
    options: EngineOptions,
}

impl<'a, A> Engine<'a, A>
where
    A: ResourceAccessor + ?Sized,
{
    pub fn new(accessor: &'a A) -> Self {
        Self::with_options(accessor, EngineOptions::default())
    }

    pub fn with_options(accessor: &'a A, options: EngineOptions) -> Self {
        Self { accessor, options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn scope(&self) -> Option<&str> {
        self.options.namespace.as_deref()
    }

    fn inventory(&self) -> Inventory {
        Inventory::with_policy(self.options.retention)
    }

    /// Run every configured check and merge the results
    pub async fn run(&self, observer: &mut dyn RunObserver) -> Result<Inventory, EngineError> {
        let mut inventory = self.inventory();
        for check in &self.options.checks {
            let found = self.run_check(*check, observer).await?;
            inventory.merge(found);
        }
        info!("Validation finished with {} findings", inventory.len());
        Ok(inventory)
    }

    pub async fn run_check(
        &self,
        check: Check,
        observer: &mut dyn RunObserver,
    ) -> Result<Inventory, EngineError> {
        info!("Examining {}", check);
        let inventory = match check {
            Check::Namespaces => self.namespaces(observer).await?,
            Check::Ingresses => self.ingresses(observer).await?,
            Check::Services => self.services(observer).await?,
            Check::Deployments => self.deployments(observer).await?,
            Check::Pods => self.pods(observer).await?,
        };
        observer.phase_finished(check, inventory.len());
        debug!("{} produced {} findings", check, inventory.len());
        Ok(inventory)
    }

    pub async fn validate_namespaces(&self) -> Result<Inventory, EngineError> {
        self.namespaces(&mut Silent).await
    }

    pub async fn validate_ingresses(&self) -> Result<Inventory, EngineError> {
        self.ingresses(&mut Silent).await
    }

    pub async fn validate_services(&self) -> Result<Inventory, EngineError> {
        self.services(&mut Silent).await
    }

    pub async fn validate_deployments(&self) -> Result<Inventory, EngineError> {
        self.deployments(&mut Silent).await
    }

    pub async fn validate_pods(&self) -> Result<Inventory, EngineError> {
        self.pods(&mut Silent).await
    }

    async fn namespaces(&self, observer: &mut dyn RunObserver) -> Result<Inventory, EngineError> {
        let mut namespaces = self
            .accessor
            .list_namespaces()
            .await
            .map_err(list_failed(SubjectKind::Namespace))?;
        if let Some(scope) = self.scope() {
            namespaces.retain(|ns| ns.metadata.name.as_deref() == Some(scope));
        }

        observer.phase_started(Check::Namespaces, namespaces.len());
        let mut inventory = self.inventory();
        for namespace in &namespaces {
            inventory.record_all(validators::validate_namespace(namespace));
            observer.resource_done(Check::Namespaces);
        }
        Ok(inventory)
    }

    async fn ingresses(&self, observer: &mut dyn RunObserver) -> Result<Inventory, EngineError> {
        let ingresses = self
            .accessor
            .list_ingresses(self.scope())
            .await
            .map_err(list_failed(SubjectKind::Ingress))?;

        observer.phase_started(Check::Ingresses, ingresses.len());
        let mut inventory = self.inventory();
        for ingress in &ingresses {
            inventory.record_all(validators::validate_ingress(self.accessor, ingress).await);
            observer.resource_done(Check::Ingresses);
        }
        Ok(inventory)
    }

    async fn services(&self, observer: &mut dyn RunObserver) -> Result<Inventory, EngineError> {
        let services = self
            .accessor
            .list_services(self.scope())
            .await
            .map_err(list_failed(SubjectKind::Service))?;

        observer.phase_started(Check::Services, services.len());
        let mut inventory = self.inventory();
        for service in &services {
            inventory.record_all(validators::validate_service(self.accessor, service).await);
            observer.resource_done(Check::Services);
        }
        Ok(inventory)
    }

    async fn deployments(&self, observer: &mut dyn RunObserver) -> Result<Inventory, EngineError> {
        let deployments = self
            .accessor
            .list_deployments(self.scope())
            .await
            .map_err(list_failed(SubjectKind::Deployment))?;

        observer.phase_started(Check::Deployments, deployments.len());
        let mut inventory = self.inventory();
        for deployment in &deployments {
            inventory.record_all(validators::validate_deployment(deployment));
            observer.resource_done(Check::Deployments);
        }
        Ok(inventory)
    }

    async fn pods(&self, observer: &mut dyn RunObserver) -> Result<Inventory, EngineError> {
        let pods = self
            .accessor
            .list_pods(self.scope(), None)
            .await
            .map_err(list_failed(SubjectKind::Pod))?;

        observer.phase_started(Check::Pods, pods.len());
        let mut inventory = self.inventory();
        for pod in &pods {
            let findings =
                validators::validate_pod(self.accessor, pod, &self.options.system_namespace).await;
            inventory.record_all(findings);
            observer.resource_done(Check::Pods);
        }
        Ok(inventory)
    }
}

fn list_failed(kind: SubjectKind) -> impl FnOnce(AccessError) -> EngineError {
    move |source| EngineError::ListFailed { kind, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_parsing() {
        assert_eq!("ingresses".parse::<Check>(), Ok(Check::Ingresses));
        assert_eq!(" SVC ".parse::<Check>(), Ok(Check::Services));
        assert_eq!("deploy".parse::<Check>(), Ok(Check::Deployments));
        assert!("secrets".parse::<Check>().is_err());
    }

    #[test]
    fn test_check_display() {
        assert_eq!(Check::Ingresses.to_string(), "ingresses");
        assert_eq!(Check::Pods.to_string(), "pods");
    }

    #[test]
    fn test_default_options() {
        let options = EngineOptions::default();
        assert_eq!(options.system_namespace, "kube-system");
        assert_eq!(options.retention, RetentionPolicy::KeepAll);
        assert_eq!(options.checks, Check::ALL.to_vec());
    }
}
