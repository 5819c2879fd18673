use super::reason;
use crate::accessor::ResourceAccessor;
use crate::model::{SubjectKind, Violation};
use crate::walker::{walk_ingress_backend, BackendPort};
use k8s_openapi::api::networking::v1::{Ingress, ServiceBackendPort};
use tracing::debug;

fn backend_port(port: Option<&ServiceBackendPort>) -> Option<BackendPort> {
    let port = port?;
    match (port.number, &port.name) {
        (Some(number), _) => Some(BackendPort::Number(number)),
        (None, Some(name)) => Some(BackendPort::Name(name.clone())),
        (None, None) => None,
    }
}

/// Walk every rule and path of an ingress down to the pods serving it.
///
/// Rules and paths are evaluated independently and in declaration order.
pub async fn validate_ingress<A>(accessor: &A, ingress: &Ingress) -> Vec<Violation>
where
    A: ResourceAccessor + ?Sized,
{
    let name = ingress.metadata.name.as_deref().unwrap_or_default();
    let namespace = ingress.metadata.namespace.as_deref().unwrap_or_default();
    let mut findings = Vec::new();

    let rules = ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_ref())
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    for rule in rules {
        let Some(http) = rule.http.as_ref() else {
            findings.push(Violation::new(
                SubjectKind::Ingress,
                namespace,
                name,
                reason::NO_HTTP_ROUTES,
            ));
            continue;
        };

        for path in &http.paths {
            let Some(service) = path.backend.service.as_ref() else {
                debug!(
                    "Ingress {}/{} path {:?} targets a resource backend, skipping",
                    namespace, name, path.path
                );
                continue;
            };

            let port = backend_port(service.port.as_ref());
            if let Err(broken) =
                walk_ingress_backend(accessor, namespace, &service.name, port.as_ref()).await
            {
                debug!(
                    "Ingress {}/{} -> service {}: {}",
                    namespace, name, service.name, broken.reason
                );
                findings.push(broken.into_violation(SubjectKind::Ingress, namespace, name));
            }
        }
    }

    findings
}
