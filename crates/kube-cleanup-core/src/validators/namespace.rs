use super::reason;
use crate::model::{SubjectKind, Violation};
use k8s_openapi::api::core::v1::Namespace;

/// Finalizer held by the control plane until a namespace is emptied
pub const CONTROL_PLANE_FINALIZER: &str = "kubernetes";

const TERMINATING: &str = "Terminating";

/// Flag namespaces that are terminating but still blocked on the core finalizer.
pub fn validate_namespace(namespace: &Namespace) -> Vec<Violation> {
    let name = namespace.metadata.name.as_deref().unwrap_or_default();

    let terminating = namespace
        .status
        .as_ref()
        .and_then(|status| status.phase.as_deref())
        == Some(TERMINATING);
    if !terminating {
        return Vec::new();
    }

    let spec_finalizers = namespace
        .spec
        .as_ref()
        .and_then(|spec| spec.finalizers.as_ref());
    let meta_finalizers = namespace.metadata.finalizers.as_ref();

    let blocked = spec_finalizers
        .into_iter()
        .chain(meta_finalizers)
        .flatten()
        .any(|finalizer| finalizer == CONTROL_PLANE_FINALIZER);

    if blocked {
        vec![Violation::new(
            SubjectKind::Namespace,
            name,
            name,
            reason::STUCK_IN_TERMINATION,
        )]
    } else {
        Vec::new()
    }
}
