use super::reason;
use crate::model::{SubjectKind, Violation};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition};

fn condition_failed<'a>(
    conditions: &'a [DeploymentCondition],
    type_: &str,
    cause: &str,
) -> Option<&'a DeploymentCondition> {
    conditions.iter().find(|c| {
        c.type_ == type_ && c.status == "False" && c.reason.as_deref() == Some(cause)
    })
}

/// Inspect a deployment's declared state and rollout status.
///
/// Every check runs; findings come back in a fixed order: scale,
/// labels, availability, progress, readiness.
pub fn validate_deployment(deployment: &Deployment) -> Vec<Violation> {
    let name = deployment.metadata.name.as_deref().unwrap_or_default();
    let namespace = deployment.metadata.namespace.as_deref().unwrap_or_default();
    let finding = |reason: String| Violation::new(SubjectKind::Deployment, namespace, name, reason);

    let status = deployment.status.as_ref();
    // Zero counts are omitted from the API representation
    let replicas = status.and_then(|s| s.replicas).unwrap_or(0);
    let ready_replicas = status.and_then(|s| s.ready_replicas).unwrap_or(0);
    let conditions = status
        .and_then(|s| s.conditions.as_ref())
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut findings = Vec::new();

    if replicas == 0 {
        findings.push(finding(reason::SCALED_TO_ZERO.to_string()));
    }

    let labelled = deployment
        .metadata
        .labels
        .as_ref()
        .is_some_and(|labels| !labels.is_empty());
    if !labelled {
        findings.push(finding(reason::NO_LABELS.to_string()));
    }

    if condition_failed(conditions, "Available", "MinimumReplicasUnavailable").is_some() {
        findings.push(finding(reason::MINIMUM_REPLICAS_UNAVAILABLE.to_string()));
    }

    if let Some(stalled) = condition_failed(conditions, "Progressing", "ProgressDeadlineExceeded") {
        let message = stalled
            .message
            .clone()
            .unwrap_or_else(|| "progress deadline exceeded".to_string());
        findings.push(finding(message));
    }

    if ready_replicas == 0 {
        findings.push(finding(reason::NO_READY_REPLICAS.to_string()));
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube_cleanup_test_fixtures as fx;
    use pretty_assertions::assert_eq;

    fn reasons(deployment: &Deployment) -> Vec<String> {
        validate_deployment(deployment)
            .into_iter()
            .map(|v| v.reason)
            .collect()
    }

    #[test]
    fn test_healthy_deployment() {
        let deployment = fx::deployment("shop", "worker")
            .label("app", "worker")
            .replicas(3, 3)
            .build();
        assert!(validate_deployment(&deployment).is_empty());
    }

    #[test]
    fn test_no_ready_replicas_only() {
        let deployment = fx::deployment("shop", "worker")
            .label("app", "worker")
            .replicas(3, 0)
            .build();
        assert_eq!(reasons(&deployment), vec!["no replicas are ready"]);
    }

    #[test]
    fn test_scaled_to_zero_without_labels() {
        let deployment = fx::deployment("shop", "batch").replicas(0, 0).build();
        assert_eq!(
            reasons(&deployment),
            vec![
                "deployment scaled down to 0 replicas",
                "no labels on deployment",
                "no replicas are ready",
            ]
        );
    }

    #[test]
    fn test_stalled_rollout_propagates_message() {
        let deployment = fx::deployment("shop", "api")
            .label("app", "api")
            .replicas(2, 1)
            .condition(
                "Progressing",
                "False",
                "ProgressDeadlineExceeded",
                "ReplicaSet \"api-5f7\" has timed out progressing.",
            )
            .build();
        assert_eq!(
            reasons(&deployment),
            vec!["ReplicaSet \"api-5f7\" has timed out progressing."]
        );
    }

    #[test]
    fn test_minimum_replicas_unavailable() {
        let deployment = fx::deployment("shop", "api")
            .label("app", "api")
            .replicas(2, 1)
            .condition(
                "Available",
                "False",
                "MinimumReplicasUnavailable",
                "Deployment does not have minimum availability.",
            )
            .build();
        assert_eq!(
            reasons(&deployment),
            vec!["minimum replicas unavailable, could be temporary"]
        );
    }

    #[test]
    fn test_true_conditions_are_ignored() {
        let deployment = fx::deployment("shop", "api")
            .label("app", "api")
            .replicas(2, 2)
            .condition("Progressing", "True", "NewReplicaSetAvailable", "ok")
            .build();
        assert!(validate_deployment(&deployment).is_empty());
    }
}
