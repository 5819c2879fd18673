//! In-memory accessor over a captured set of resources
//!
//! Snapshots are read from YAML or JSON manifests such as the output of
//! `kubectl get namespaces,ingresses,services,deployments,replicasets,pods -A -o yaml`.
//! Multi-document streams and `kind: List` wrappers are both accepted.

use crate::accessor::ResourceAccessor;
use crate::error::{AccessError, SnapshotError};
use crate::selector::LabelSelector;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct SnapshotAccessor {
    namespaces: Vec<Namespace>,
    ingresses: Vec<Ingress>,
    services: Vec<Service>,
    deployments: Vec<Deployment>,
    replica_sets: Vec<ReplicaSet>,
    pods: Vec<Pod>,
}

impl SnapshotAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespaces.push(namespace);
        self
    }

    pub fn with_ingress(mut self, ingress: Ingress) -> Self {
        self.ingresses.push(ingress);
        self
    }

    pub fn with_service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn with_deployment(mut self, deployment: Deployment) -> Self {
        self.deployments.push(deployment);
        self
    }

    pub fn with_replica_set(mut self, replica_set: ReplicaSet) -> Self {
        self.replica_sets.push(replica_set);
        self
    }

    pub fn with_pod(mut self, pod: Pod) -> Self {
        self.pods.push(pod);
        self
    }

    /// Load a manifest file and add its objects to the snapshot
    pub fn load_file(&mut self, path: &Path) -> Result<usize, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let added = self.load_str(&content)?;
        debug!("Loaded {} objects from {:?}", added, path);
        Ok(added)
    }

    /// Add every supported object found in a YAML or JSON manifest stream
    pub fn load_str(&mut self, content: &str) -> Result<usize, SnapshotError> {
        let mut added = 0;
        for document in serde_yaml::Deserializer::from_str(content) {
            let value = serde_yaml::Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }
            let value = serde_json::to_value(value)?;
            added += self.add_object(value)?;
        }
        Ok(added)
    }

    fn add_object(&mut self, value: serde_json::Value) -> Result<usize, SnapshotError> {
        let kind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .ok_or(SnapshotError::MissingKind)?
            .to_string();

        match kind.as_str() {
            "List" | "NamespaceList" | "IngressList" | "ServiceList" | "DeploymentList"
            | "ReplicaSetList" | "PodList" => {
                let items = match value.get("items") {
                    Some(serde_json::Value::Array(items)) => items.clone(),
                    _ => Vec::new(),
                };
                let mut added = 0;
                for mut item in items {
                    // Typed lists omit the kind on their items
                    if item.get("kind").is_none() && kind != "List" {
                        if let Some(map) = item.as_object_mut() {
                            let item_kind = kind.trim_end_matches("List").to_string();
                            map.insert("kind".to_string(), serde_json::Value::String(item_kind));
                        }
                    }
                    added += self.add_object(item)?;
                }
                Ok(added)
            }
            "Namespace" => {
                self.namespaces.push(serde_json::from_value(value)?);
                Ok(1)
            }
            "Ingress" => {
                self.ingresses.push(serde_json::from_value(value)?);
                Ok(1)
            }
            "Service" => {
                self.services.push(serde_json::from_value(value)?);
                Ok(1)
            }
            "Deployment" => {
                self.deployments.push(serde_json::from_value(value)?);
                Ok(1)
            }
            "ReplicaSet" => {
                self.replica_sets.push(serde_json::from_value(value)?);
                Ok(1)
            }
            "Pod" => {
                self.pods.push(serde_json::from_value(value)?);
                Ok(1)
            }
            other => {
                warn!("Skipping unsupported kind {} in snapshot", other);
                Ok(0)
            }
        }
    }
}

fn in_scope(meta: &ObjectMeta, namespace: Option<&str>) -> bool {
    namespace.map_or(true, |ns| meta.namespace.as_deref() == Some(ns))
}

fn named(meta: &ObjectMeta, namespace: &str, name: &str) -> bool {
    meta.namespace.as_deref() == Some(namespace) && meta.name.as_deref() == Some(name)
}

#[async_trait]
impl ResourceAccessor for SnapshotAccessor {
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, AccessError> {
        Ok(self.namespaces.clone())
    }

    async fn list_ingresses(&self, namespace: Option<&str>) -> Result<Vec<Ingress>, AccessError> {
        Ok(self
            .ingresses
            .iter()
            .filter(|i| in_scope(&i.metadata, namespace))
            .cloned()
            .collect())
    }

    async fn list_services(&self, namespace: Option<&str>) -> Result<Vec<Service>, AccessError> {
        Ok(self
            .services
            .iter()
            .filter(|s| in_scope(&s.metadata, namespace))
            .cloned()
            .collect())
    }

    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Service>, AccessError> {
        Ok(self
            .services
            .iter()
            .find(|s| named(&s.metadata, namespace, name))
            .cloned())
    }

    async fn list_pods(
        &self,
        namespace: Option<&str>,
        selector: Option<&LabelSelector>,
    ) -> Result<Vec<Pod>, AccessError> {
        Ok(self
            .pods
            .iter()
            .filter(|p| in_scope(&p.metadata, namespace))
            .filter(|p| selector.map_or(true, |s| s.matches(p.metadata.labels.as_ref())))
            .cloned()
            .collect())
    }

    async fn get_replica_set(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ReplicaSet>, AccessError> {
        Ok(self
            .replica_sets
            .iter()
            .find(|rs| named(&rs.metadata, namespace, name))
            .cloned())
    }

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, AccessError> {
        Ok(self
            .deployments
            .iter()
            .find(|d| named(&d.metadata, namespace, name))
            .cloned())
    }

    async fn list_deployments(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<Deployment>, AccessError> {
        Ok(self
            .deployments
            .iter()
            .filter(|d| in_scope(&d.metadata, namespace))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
apiVersion: v1
kind: List
items:
  - apiVersion: v1
    kind: Pod
    metadata:
      name: api-1
      namespace: shop
      labels:
        app: api
  - apiVersion: v1
    kind: Pod
    metadata:
      name: web-1
      namespace: shop
      labels:
        app: web
---
apiVersion: v1
kind: Service
metadata:
  name: api
  namespace: shop
spec:
  selector:
    app: api
  ports:
    - port: 80
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
  namespace: shop
"#;

    #[tokio::test]
    async fn test_load_multi_document_manifest() {
        let mut snapshot = SnapshotAccessor::new();
        let added = snapshot.load_str(MANIFEST).unwrap();
        assert_eq!(added, 3);

        let service = snapshot.get_service("shop", "api").await.unwrap();
        assert!(service.is_some());
        assert!(snapshot.get_service("other", "api").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pod_selection() {
        let mut snapshot = SnapshotAccessor::new();
        snapshot.load_str(MANIFEST).unwrap();

        let selector = LabelSelector::new().with("app", "api");
        let pods = snapshot.list_pods(Some("shop"), Some(&selector)).await.unwrap();
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].metadata.name.as_deref(), Some("api-1"));

        let all = snapshot.list_pods(None, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_typed_list_items_without_kind() {
        let manifest = r#"{
  "apiVersion": "v1",
  "kind": "PodList",
  "items": [{"metadata": {"name": "lonely", "namespace": "shop"}}]
}"#;
        let mut snapshot = SnapshotAccessor::new();
        assert_eq!(snapshot.load_str(manifest).unwrap(), 1);
    }

    #[test]
    fn test_document_without_kind_is_rejected() {
        let mut snapshot = SnapshotAccessor::new();
        let err = snapshot.load_str("metadata:\n  name: x\n").unwrap_err();
        assert!(matches!(err, SnapshotError::MissingKind));
    }
}
