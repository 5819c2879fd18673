//! Live cluster access through kube-rs

use crate::accessor::ResourceAccessor;
use crate::error::AccessError;
use crate::selector::LabelSelector;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams};
use kube::Client;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::trace;

/// [`ResourceAccessor`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeAccessor {
    client: Client,
}

impl KubeAccessor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the inferred configuration (kubeconfig or in-cluster)
    pub async fn try_default() -> Result<Self, AccessError> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    fn scoped<K>(&self, namespace: Option<&str>) -> Api<K>
    where
        K: kube::Resource<Scope = NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        match namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        }
    }

    async fn list_scoped<K>(
        &self,
        namespace: Option<&str>,
        params: &ListParams,
    ) -> Result<Vec<K>, AccessError>
    where
        K: kube::Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as kube::Resource>::DynamicType: Default,
    {
        let api: Api<K> = self.scoped(namespace);
        Ok(api.list(params).await?.items)
    }

    async fn get_scoped<K>(&self, namespace: &str, name: &str) -> Result<Option<K>, AccessError>
    where
        K: kube::Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as kube::Resource>::DynamicType: Default,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }
}

#[async_trait]
impl ResourceAccessor for KubeAccessor {
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, AccessError> {
        trace!("Listing namespaces");
        let api: Api<Namespace> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn list_ingresses(&self, namespace: Option<&str>) -> Result<Vec<Ingress>, AccessError> {
        trace!("Listing ingresses in {:?}", namespace);
        self.list_scoped(namespace, &ListParams::default()).await
    }

    async fn list_services(&self, namespace: Option<&str>) -> Result<Vec<Service>, AccessError> {
        trace!("Listing services in {:?}", namespace);
        self.list_scoped(namespace, &ListParams::default()).await
    }

    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Service>, AccessError> {
        trace!("Fetching service {}/{}", namespace, name);
        self.get_scoped(namespace, name).await
    }

    async fn list_pods(
        &self,
        namespace: Option<&str>,
        selector: Option<&LabelSelector>,
    ) -> Result<Vec<Pod>, AccessError> {
        let mut params = ListParams::default();
        if let Some(selector) = selector.filter(|s| !s.is_empty()) {
            params = params.labels(&selector.to_string());
        }
        trace!("Listing pods in {:?} with {:?}", namespace, params.label_selector);
        self.list_scoped(namespace, &params).await
    }

    async fn get_replica_set(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ReplicaSet>, AccessError> {
        trace!("Fetching replica set {}/{}", namespace, name);
        self.get_scoped(namespace, name).await
    }

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, AccessError> {
        trace!("Fetching deployment {}/{}", namespace, name);
        self.get_scoped(namespace, name).await
    }

    async fn list_deployments(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<Deployment>, AccessError> {
        trace!("Listing deployments in {:?}", namespace);
        self.list_scoped(namespace, &ListParams::default()).await
    }
}
