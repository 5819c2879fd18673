use super::reason;
use crate::accessor::ResourceAccessor;
use crate::model::{SubjectKind, Violation};
use crate::walker::{service_selector, walk_selector_to_pods};
use k8s_openapi::api::core::v1::Service;
use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;
use tracing::debug;

const LOAD_BALANCER: &str = "LoadBalancer";
const EXTERNAL_NAME: &str = "ExternalName";

static DNS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").expect("valid DNS label pattern")
});

/// Whether a value can be served as a CNAME: a DNS domain name, never an IP address.
pub fn is_valid_cname(value: &str) -> bool {
    if value.parse::<IpAddr>().is_ok() {
        return false;
    }

    let name = value.strip_suffix('.').unwrap_or(value);
    if name.is_empty() || name.len() > 253 {
        return false;
    }

    name.split('.').all(|label| DNS_LABEL.is_match(label))
}

fn is_bootstrap_service(namespace: &str, name: &str) -> bool {
    namespace == "default" && name == "kubernetes"
}

/// Check that a service can route traffic somewhere.
///
/// The first matching branch decides: selector presence, then
/// LoadBalancer provisioning, then ExternalName syntax, then backing pods.
pub async fn validate_service<A>(accessor: &A, service: &Service) -> Vec<Violation>
where
    A: ResourceAccessor + ?Sized,
{
    let name = service.metadata.name.as_deref().unwrap_or_default();
    let namespace = service.metadata.namespace.as_deref().unwrap_or_default();

    if is_bootstrap_service(namespace, name) {
        return Vec::new();
    }

    let spec = service.spec.as_ref();
    let service_type = spec.and_then(|spec| spec.type_.as_deref());
    let selector = service_selector(service);

    if selector.is_empty() && service_type != Some(EXTERNAL_NAME) {
        return vec![Violation::new(
            SubjectKind::Service,
            namespace,
            name,
            reason::NO_SELECTOR,
        )];
    }

    match service_type {
        Some(LOAD_BALANCER) => {
            let provisioned = service
                .status
                .as_ref()
                .and_then(|status| status.load_balancer.as_ref())
                .and_then(|lb| lb.ingress.as_ref())
                .is_some_and(|ingress| !ingress.is_empty());

            if provisioned {
                Vec::new()
            } else {
                vec![Violation::new(
                    SubjectKind::Service,
                    namespace,
                    name,
                    reason::LOAD_BALANCER_PENDING,
                )]
            }
        }
        Some(EXTERNAL_NAME) => {
            let external_name = spec
                .and_then(|spec| spec.external_name.as_deref())
                .unwrap_or_default();

            if is_valid_cname(external_name) {
                Vec::new()
            } else {
                vec![Violation::new(
                    SubjectKind::Service,
                    namespace,
                    name,
                    format!("{} is not a valid CNAME", external_name),
                )]
            }
        }
        _ => match walk_selector_to_pods(accessor, namespace, &selector).await {
            Ok(count) => {
                debug!("Service {}/{} is backed by {} pods", namespace, name, count);
                Vec::new()
            }
            Err(broken) => vec![broken.into_violation(SubjectKind::Service, namespace, name)],
        },
    }
}
