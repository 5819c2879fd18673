//! Dependency walking over the fixed resource chains
//!
//! Two chains are followed, each hop issuing one accessor call:
//!
//! - Ingress backend -> Service -> selector -> Pods
//! - Pod -> ReplicaSet -> Deployment
//!
//! Every walk stops at the first broken hop and reports it as a
//! [`BrokenLink`]. Absence and lookup failure end a walk the same way; the
//! failure text is kept as detail.

use crate::accessor::ResourceAccessor;
use crate::error::AccessError;
use crate::model::{OwnerKind, ResourceReference, SubjectKind, Violation};
use crate::selector::LabelSelector;
use crate::validators::reason;
use k8s_openapi::api::core::v1::{Pod, Service};
use std::fmt;
use tracing::{debug, warn};

/// A dependency that could not be resolved or is unusable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLink {
    pub reason: String,
    pub reference: Option<ResourceReference>,
    pub detail: Option<String>,
}

impl BrokenLink {
    fn new(reason: impl Into<String>, reference: ResourceReference) -> Self {
        Self {
            reason: reason.into(),
            reference: Some(reference),
            detail: None,
        }
    }

    fn failed(reason: impl Into<String>, reference: ResourceReference, err: &AccessError) -> Self {
        Self {
            reason: reason.into(),
            reference: Some(reference),
            detail: Some(err.to_string()),
        }
    }

    pub fn into_violation(self, kind: SubjectKind, namespace: &str, name: &str) -> Violation {
        Violation {
            subject_kind: kind,
            subject_name: name.to_string(),
            namespace: namespace.to_string(),
            reason: self.reason,
            reference: self.reference,
            detail: self.detail,
        }
    }
}

/// Port an ingress backend targets on its service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendPort {
    Number(i32),
    Name(String),
}

impl BackendPort {
    fn exposed_by(&self, service: &Service) -> bool {
        let ports = service
            .spec
            .as_ref()
            .and_then(|spec| spec.ports.as_ref())
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        match self {
            BackendPort::Number(number) => ports.iter().any(|p| p.port == *number),
            BackendPort::Name(name) => ports.iter().any(|p| p.name.as_deref() == Some(name.as_str())),
        }
    }
}

impl fmt::Display for BackendPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendPort::Number(number) => write!(f, "{}", number),
            BackendPort::Name(name) => f.write_str(name),
        }
    }
}

/// Selector a service uses to pick its pods
pub fn service_selector(service: &Service) -> LabelSelector {
    service
        .spec
        .as_ref()
        .and_then(|spec| spec.selector.as_ref())
        .map(LabelSelector::from_map)
        .unwrap_or_default()
}

/// Follow an ingress backend through its service down to the pods.
pub async fn walk_ingress_backend<A>(
    accessor: &A,
    namespace: &str,
    service_name: &str,
    port: Option<&BackendPort>,
) -> Result<(), BrokenLink>
where
    A: ResourceAccessor + ?Sized,
{
    debug!("Resolving backend service {}/{}", namespace, service_name);
    let service = match accessor.get_service(namespace, service_name).await {
        Ok(Some(service)) => service,
        Ok(None) => {
            return Err(BrokenLink::new(
                reason::MISSING_SERVICE,
                ResourceReference::service(service_name),
            ))
        }
        Err(err) => {
            warn!(
                "Failed to fetch service {}/{}: {}",
                namespace, service_name, err
            );
            return Err(BrokenLink::failed(
                reason::MISSING_SERVICE,
                ResourceReference::service(service_name),
                &err,
            ));
        }
    };

    if let Some(port) = port.filter(|port| !port.exposed_by(&service)) {
        return Err(BrokenLink::new(
            format!("service doesn't expose ingress port {}", port),
            ResourceReference::service(service_name),
        ));
    }

    // An empty selector matches every pod in the namespace
    let selector = service_selector(&service);
    walk_selector_to_pods(accessor, namespace, &selector)
        .await
        .map(|_| ())
}

/// Resolve a selector to the pods backing it, failing when there are none.
pub async fn walk_selector_to_pods<A>(
    accessor: &A,
    namespace: &str,
    selector: &LabelSelector,
) -> Result<usize, BrokenLink>
where
    A: ResourceAccessor + ?Sized,
{
    let reference = ResourceReference::pods(selector.to_string());
    debug!("Listing pods in {} matching {}", namespace, selector);

    match accessor.list_pods(Some(namespace), Some(selector)).await {
        Ok(pods) if pods.is_empty() => Err(BrokenLink::new(reason::NO_PODS, reference)),
        Ok(pods) => Ok(pods.len()),
        Err(err) => {
            warn!(
                "Failed to list pods in {} matching {}: {}",
                namespace, selector, err
            );
            Err(BrokenLink::failed(reason::NO_WORKLOADS, reference, &err))
        }
    }
}

/// Follow a pod's ownership two hops up: ReplicaSet, then Deployment.
///
/// Returns one broken link per missing owner, in owner-reference order.
pub async fn walk_pod_owners<A>(accessor: &A, pod: &Pod) -> Vec<BrokenLink>
where
    A: ResourceAccessor + ?Sized,
{
    let namespace = pod.metadata.namespace.as_deref().unwrap_or_default();
    let mut broken = Vec::new();

    for owner in pod.metadata.owner_references.iter().flatten() {
        match OwnerKind::from(owner.kind.as_str()) {
            OwnerKind::ReplicaSet => {
                let reference = ResourceReference::replica_set(&owner.name);
                let replica_set = match accessor.get_replica_set(namespace, &owner.name).await {
                    Ok(Some(replica_set)) => replica_set,
                    Ok(None) => {
                        broken.push(BrokenLink::new(reason::OWNER_MISSING, reference));
                        continue;
                    }
                    Err(err) => {
                        warn!(
                            "Failed to fetch replica set {}/{}: {}",
                            namespace, owner.name, err
                        );
                        broken.push(BrokenLink::failed(reason::OWNER_MISSING, reference, &err));
                        continue;
                    }
                };

                for grand_owner in replica_set.metadata.owner_references.iter().flatten() {
                    if OwnerKind::from(grand_owner.kind.as_str()) != OwnerKind::Deployment {
                        continue;
                    }
                    let reference = ResourceReference::deployment(&grand_owner.name);
                    match accessor.get_deployment(namespace, &grand_owner.name).await {
                        Ok(Some(_)) => {}
                        Ok(None) => broken.push(BrokenLink::new(
                            reason::OWNER_OF_OWNER_MISSING,
                            reference,
                        )),
                        Err(err) => {
                            warn!(
                                "Failed to fetch deployment {}/{}: {}",
                                namespace, grand_owner.name, err
                            );
                            broken.push(BrokenLink::failed(
                                reason::OWNER_OF_OWNER_MISSING,
                                reference,
                                &err,
                            ));
                        }
                    }
                }
            }
            // Only the ReplicaSet chain is walked; other controllers own pods directly
            OwnerKind::Deployment | OwnerKind::Other(_) => {}
        }
    }

    broken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotAccessor;
    use kube_cleanup_test_fixtures as fx;

    #[tokio::test]
    async fn test_backend_port_by_number() {
        let snapshot = SnapshotAccessor::new()
            .with_service(fx::service("shop", "cart").port(8080).selector("app", "cart").build())
            .with_pod(fx::pod("shop", "cart-1").label("app", "cart").build());

        let ok = walk_ingress_backend(&snapshot, "shop", "cart", Some(&BackendPort::Number(8080))).await;
        assert_eq!(ok, Ok(()));

        let broken = walk_ingress_backend(&snapshot, "shop", "cart", Some(&BackendPort::Number(80)))
            .await
            .unwrap_err();
        assert_eq!(broken.reason, "service doesn't expose ingress port 80");
        assert_eq!(broken.reference, Some(ResourceReference::service("cart")));
    }

    #[tokio::test]
    async fn test_backend_port_by_name() {
        let snapshot = SnapshotAccessor::new()
            .with_service(
                fx::service("shop", "cart")
                    .named_port("http", 8080)
                    .selector("app", "cart")
                    .build(),
            )
            .with_pod(fx::pod("shop", "cart-1").label("app", "cart").build());

        let port = BackendPort::Name("http".to_string());
        assert!(walk_ingress_backend(&snapshot, "shop", "cart", Some(&port)).await.is_ok());

        let port = BackendPort::Name("grpc".to_string());
        let broken = walk_ingress_backend(&snapshot, "shop", "cart", Some(&port))
            .await
            .unwrap_err();
        assert_eq!(broken.reason, "service doesn't expose ingress port grpc");
    }

    #[tokio::test]
    async fn test_selectorless_backend_lists_whole_namespace() {
        let snapshot = SnapshotAccessor::new()
            .with_service(fx::service("shop", "cart").port(80).build());

        let broken = walk_ingress_backend(&snapshot, "shop", "cart", Some(&BackendPort::Number(80)))
            .await
            .unwrap_err();
        assert_eq!(broken.reason, reason::NO_PODS);
        assert_eq!(broken.reference, Some(ResourceReference::pods("")));

        let snapshot = snapshot.with_pod(fx::pod("shop", "anything").build());
        let ok = walk_ingress_backend(&snapshot, "shop", "cart", Some(&BackendPort::Number(80))).await;
        assert_eq!(ok, Ok(()));
    }

    #[tokio::test]
    async fn test_selector_without_pods() {
        let snapshot = SnapshotAccessor::new();
        let selector = LabelSelector::new().with("app", "api");

        let broken = walk_selector_to_pods(&snapshot, "shop", &selector)
            .await
            .unwrap_err();
        assert_eq!(broken.reason, reason::NO_PODS);
        assert_eq!(broken.reference, Some(ResourceReference::pods("app=api")));
        assert_eq!(broken.detail, None);
    }

    #[tokio::test]
    async fn test_pod_owner_chain_intact() {
        let snapshot = SnapshotAccessor::new()
            .with_deployment(fx::deployment("shop", "api").build())
            .with_replica_set(
                fx::replica_set("shop", "api-7d9f")
                    .owned_by("Deployment", "api")
                    .build(),
            );
        let pod = fx::pod("shop", "api-7d9f-x2").owned_by("ReplicaSet", "api-7d9f").build();

        assert!(walk_pod_owners(&snapshot, &pod).await.is_empty());
    }

    #[tokio::test]
    async fn test_pod_owned_by_other_controllers_is_not_walked() {
        let snapshot = SnapshotAccessor::new();
        let pod = fx::pod("shop", "db-0").owned_by("StatefulSet", "db").build();

        assert!(walk_pod_owners(&snapshot, &pod).await.is_empty());
    }
}
