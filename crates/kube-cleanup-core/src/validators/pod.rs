use super::reason;
use crate::accessor::ResourceAccessor;
use crate::model::{SubjectKind, Violation};
use crate::walker::walk_pod_owners;
use k8s_openapi::api::core::v1::Pod;

/// Check that a pod is still reachable from the controller chain that created it.
///
/// Pods in `system_namespace` are never inspected.
pub async fn validate_pod<A>(accessor: &A, pod: &Pod, system_namespace: &str) -> Vec<Violation>
where
    A: ResourceAccessor + ?Sized,
{
    let name = pod.metadata.name.as_deref().unwrap_or_default();
    let namespace = pod.metadata.namespace.as_deref().unwrap_or_default();

    if namespace == system_namespace {
        return Vec::new();
    }

    let owned = pod
        .metadata
        .owner_references
        .as_ref()
        .is_some_and(|owners| !owners.is_empty());
    if !owned {
        return vec![Violation::new(
            SubjectKind::Pod,
            namespace,
            name,
            reason::NOT_OWNED,
        )];
    }

    walk_pod_owners(accessor, pod)
        .await
        .into_iter()
        .map(|broken| broken.into_violation(SubjectKind::Pod, namespace, name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceReference;
    use crate::snapshot::SnapshotAccessor;
    use kube_cleanup_test_fixtures as fx;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_unowned_pod() {
        let snapshot = SnapshotAccessor::new();
        let pod = fx::pod("shop", "debug").build();

        let findings = validate_pod(&snapshot, &pod, "kube-system").await;
        assert_eq!(
            findings,
            vec![Violation::new(
                SubjectKind::Pod,
                "shop",
                "debug",
                "pod is not owned by anyone"
            )]
        );
    }

    #[tokio::test]
    async fn test_system_namespace_is_skipped() {
        let snapshot = SnapshotAccessor::new();
        let pod = fx::pod("kube-system", "etcd-node-1").build();

        assert!(validate_pod(&snapshot, &pod, "kube-system").await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_replica_set() {
        let snapshot = SnapshotAccessor::new();
        let pod = fx::pod("shop", "api-7d9f-x2").owned_by("ReplicaSet", "api-7d9f").build();

        let findings = validate_pod(&snapshot, &pod, "kube-system").await;
        assert_eq!(
            findings,
            vec![Violation::new(SubjectKind::Pod, "shop", "api-7d9f-x2", "owner is missing")
                .with_reference(ResourceReference::replica_set("api-7d9f"))]
        );
    }

    #[tokio::test]
    async fn test_missing_deployment() {
        let snapshot = SnapshotAccessor::new().with_replica_set(
            fx::replica_set("shop", "api-7d9f")
                .owned_by("Deployment", "api")
                .build(),
        );
        let pod = fx::pod("shop", "api-7d9f-x2").owned_by("ReplicaSet", "api-7d9f").build();

        let findings = validate_pod(&snapshot, &pod, "kube-system").await;
        assert_eq!(
            findings,
            vec![Violation::new(
                SubjectKind::Pod,
                "shop",
                "api-7d9f-x2",
                "owner of the owner is missing"
            )
            .with_reference(ResourceReference::deployment("api"))]
        );
    }
}
