//! Shared helpers for engine integration tests

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube_cleanup_core::{AccessError, LabelSelector, ResourceAccessor, SnapshotAccessor};
use std::collections::HashSet;
use std::sync::Mutex;

/// Accessor call, as observed by [`RecordingAccessor`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    ListNamespaces,
    ListIngresses,
    ListServices,
    GetService(String),
    ListPods(Option<String>),
    GetReplicaSet(String),
    GetDeployment(String),
    ListDeployments,
}

impl Call {
    /// Same call family, ignoring arguments
    fn family(&self) -> &'static str {
        match self {
            Call::ListNamespaces => "list_namespaces",
            Call::ListIngresses => "list_ingresses",
            Call::ListServices => "list_services",
            Call::GetService(_) => "get_service",
            Call::ListPods(_) => "list_pods",
            Call::GetReplicaSet(_) => "get_replica_set",
            Call::GetDeployment(_) => "get_deployment",
            Call::ListDeployments => "list_deployments",
        }
    }
}

/// Wraps a snapshot, recording every call and failing the ones asked to fail
pub struct RecordingAccessor {
    inner: SnapshotAccessor,
    calls: Mutex<Vec<Call>>,
    failing: HashSet<&'static str>,
}

impl RecordingAccessor {
    pub fn new(inner: SnapshotAccessor) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            failing: HashSet::new(),
        }
    }

    /// Make every call of this family (e.g. `"list_pods"`) fail
    pub fn failing(mut self, family: &'static str) -> Self {
        self.failing.insert(family);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pod_queries(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::ListPods(Some(_))))
            .count()
    }

    fn observe(&self, call: Call) -> Result<(), AccessError> {
        let family = call.family();
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(family) {
            Err(AccessError::Api(format!("{} refused: connection reset", family)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ResourceAccessor for RecordingAccessor {
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, AccessError> {
        self.observe(Call::ListNamespaces)?;
        self.inner.list_namespaces().await
    }

    async fn list_ingresses(&self, namespace: Option<&str>) -> Result<Vec<Ingress>, AccessError> {
        self.observe(Call::ListIngresses)?;
        self.inner.list_ingresses(namespace).await
    }

    async fn list_services(&self, namespace: Option<&str>) -> Result<Vec<Service>, AccessError> {
        self.observe(Call::ListServices)?;
        self.inner.list_services(namespace).await
    }

    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Service>, AccessError> {
        self.observe(Call::GetService(name.to_string()))?;
        self.inner.get_service(namespace, name).await
    }

    async fn list_pods(
        &self,
        namespace: Option<&str>,
        selector: Option<&LabelSelector>,
    ) -> Result<Vec<Pod>, AccessError> {
        self.observe(Call::ListPods(selector.map(|s| s.to_string())))?;
        self.inner.list_pods(namespace, selector).await
    }

    async fn get_replica_set(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ReplicaSet>, AccessError> {
        self.observe(Call::GetReplicaSet(name.to_string()))?;
        self.inner.get_replica_set(namespace, name).await
    }

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, AccessError> {
        self.observe(Call::GetDeployment(name.to_string()))?;
        self.inner.get_deployment(namespace, name).await
    }

    async fn list_deployments(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<Deployment>, AccessError> {
        self.observe(Call::ListDeployments)?;
        self.inner.list_deployments(namespace).await
    }
}
