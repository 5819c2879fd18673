//! The cluster access capability consumed by the validators

use crate::error::AccessError;
use crate::selector::LabelSelector;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;

/// Read-only view over the resources of a cluster.
///
/// Listing calls take an optional namespace; `None` means all namespaces.
/// Named lookups return `Ok(None)` when the object does not exist. Any
/// timeout, retry or cancellation policy belongs to the implementation.
#[async_trait]
pub trait ResourceAccessor: Send + Sync {
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, AccessError>;

    async fn list_ingresses(&self, namespace: Option<&str>) -> Result<Vec<Ingress>, AccessError>;

    async fn list_services(&self, namespace: Option<&str>) -> Result<Vec<Service>, AccessError>;

    async fn get_service(&self, namespace: &str, name: &str)
        -> Result<Option<Service>, AccessError>;

    async fn list_pods(
        &self,
        namespace: Option<&str>,
        selector: Option<&LabelSelector>,
    ) -> Result<Vec<Pod>, AccessError>;

    async fn get_replica_set(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ReplicaSet>, AccessError>;

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, AccessError>;

    async fn list_deployments(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<Deployment>, AccessError>;
}
