//! Test fixtures for kube-cleanup
//!
//! Small builders for the Kubernetes objects the validators inspect, plus
//! helpers to write them out as manifest files.

use k8s_openapi::api::apps::v1::{
    Deployment, DeploymentCondition, DeploymentStatus, ReplicaSet,
};
use k8s_openapi::api::core::v1::{
    LoadBalancerIngress, LoadBalancerStatus, Namespace, NamespaceSpec, NamespaceStatus, Pod,
    Service, ServicePort, ServiceSpec, ServiceStatus,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use serde::Serialize;
use std::io::Write;

fn meta(namespace: Option<&str>, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        ..Default::default()
    }
}

fn add_label(meta: &mut ObjectMeta, key: &str, value: &str) {
    meta.labels
        .get_or_insert_with(Default::default)
        .insert(key.to_string(), value.to_string());
}

fn add_owner(meta: &mut ObjectMeta, api_version: &str, kind: &str, name: &str) {
    meta.owner_references
        .get_or_insert_with(Vec::new)
        .push(OwnerReference {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            uid: format!("uid-{}", name),
            controller: Some(true),
            ..Default::default()
        });
}

fn owner_api_version(kind: &str) -> &'static str {
    match kind {
        "ReplicaSet" | "Deployment" | "StatefulSet" | "DaemonSet" => "apps/v1",
        "Job" => "batch/v1",
        _ => "v1",
    }
}

pub struct NamespaceBuilder(Namespace);

pub fn namespace(name: &str) -> NamespaceBuilder {
    NamespaceBuilder(Namespace {
        metadata: meta(None, name),
        ..Default::default()
    })
}

impl NamespaceBuilder {
    pub fn phase(mut self, phase: &str) -> Self {
        self.0.status = Some(NamespaceStatus {
            phase: Some(phase.to_string()),
            ..Default::default()
        });
        self
    }

    /// Add a finalizer to `spec.finalizers`
    pub fn finalizer(mut self, finalizer: &str) -> Self {
        self.0
            .spec
            .get_or_insert_with(NamespaceSpec::default)
            .finalizers
            .get_or_insert_with(Vec::new)
            .push(finalizer.to_string());
        self
    }

    pub fn build(self) -> Namespace {
        self.0
    }
}

pub struct ServiceBuilder(Service);

pub fn service(namespace: &str, name: &str) -> ServiceBuilder {
    ServiceBuilder(Service {
        metadata: meta(Some(namespace), name),
        spec: Some(ServiceSpec::default()),
        ..Default::default()
    })
}

impl ServiceBuilder {
    fn spec(&mut self) -> &mut ServiceSpec {
        self.0.spec.get_or_insert_with(ServiceSpec::default)
    }

    pub fn port(mut self, port: i32) -> Self {
        self.spec().ports.get_or_insert_with(Vec::new).push(ServicePort {
            port,
            ..Default::default()
        });
        self
    }

    pub fn named_port(mut self, name: &str, port: i32) -> Self {
        self.spec().ports.get_or_insert_with(Vec::new).push(ServicePort {
            name: Some(name.to_string()),
            port,
            ..Default::default()
        });
        self
    }

    pub fn selector(mut self, key: &str, value: &str) -> Self {
        self.spec()
            .selector
            .get_or_insert_with(Default::default)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn service_type(mut self, service_type: &str) -> Self {
        self.spec().type_ = Some(service_type.to_string());
        self
    }

    /// Make this an ExternalName service aliasing `external_name`
    pub fn external_name(mut self, external_name: &str) -> Self {
        let spec = self.spec();
        spec.type_ = Some("ExternalName".to_string());
        spec.external_name = Some(external_name.to_string());
        self
    }

    /// Mark the load balancer as provisioned at `ip`
    pub fn load_balancer_ip(mut self, ip: &str) -> Self {
        self.0.status = Some(ServiceStatus {
            load_balancer: Some(LoadBalancerStatus {
                ingress: Some(vec![LoadBalancerIngress {
                    ip: Some(ip.to_string()),
                    ..Default::default()
                }]),
            }),
            ..Default::default()
        });
        self
    }

    pub fn build(self) -> Service {
        self.0
    }
}

pub struct IngressBuilder(Ingress);

pub fn ingress(namespace: &str, name: &str) -> IngressBuilder {
    IngressBuilder(Ingress {
        metadata: meta(Some(namespace), name),
        spec: Some(IngressSpec::default()),
        ..Default::default()
    })
}

impl IngressBuilder {
    fn rules(&mut self) -> &mut Vec<IngressRule> {
        self.0
            .spec
            .get_or_insert_with(IngressSpec::default)
            .rules
            .get_or_insert_with(Vec::new)
    }

    /// Add a rule that declares no HTTP paths
    pub fn rule_without_http(mut self, host: &str) -> Self {
        self.rules().push(IngressRule {
            host: Some(host.to_string()),
            http: None,
        });
        self
    }

    /// Start a new HTTP rule, so following paths land in a separate rule
    pub fn rule(mut self, host: &str) -> Self {
        self.rules().push(IngressRule {
            host: Some(host.to_string()),
            http: Some(HTTPIngressRuleValue { paths: Vec::new() }),
        });
        self
    }

    fn push_path(&mut self, path: &str, service: &str, port: ServiceBackendPort) {
        let rules = self.rules();
        if !rules.last().is_some_and(|rule| rule.http.is_some()) {
            rules.push(IngressRule {
                host: None,
                http: Some(HTTPIngressRuleValue { paths: Vec::new() }),
            });
        }
        if let Some(http) = rules.last_mut().and_then(|rule| rule.http.as_mut()) {
            http.paths.push(HTTPIngressPath {
                path: Some(path.to_string()),
                path_type: "Prefix".to_string(),
                backend: IngressBackend {
                    service: Some(IngressServiceBackend {
                        name: service.to_string(),
                        port: Some(port),
                    }),
                    resource: None,
                },
            });
        }
    }

    /// Route `path` to a service port by number
    pub fn path(mut self, path: &str, service: &str, port: i32) -> Self {
        self.push_path(
            path,
            service,
            ServiceBackendPort {
                number: Some(port),
                name: None,
            },
        );
        self
    }

    /// Route `path` to a service port by name
    pub fn named_path(mut self, path: &str, service: &str, port: &str) -> Self {
        self.push_path(
            path,
            service,
            ServiceBackendPort {
                number: None,
                name: Some(port.to_string()),
            },
        );
        self
    }

    pub fn build(self) -> Ingress {
        self.0
    }
}

pub struct DeploymentBuilder(Deployment);

pub fn deployment(namespace: &str, name: &str) -> DeploymentBuilder {
    DeploymentBuilder(Deployment {
        metadata: meta(Some(namespace), name),
        ..Default::default()
    })
}

impl DeploymentBuilder {
    fn status(&mut self) -> &mut DeploymentStatus {
        self.0.status.get_or_insert_with(DeploymentStatus::default)
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        add_label(&mut self.0.metadata, key, value);
        self
    }

    /// Set the observed replica counts
    pub fn replicas(mut self, replicas: i32, ready: i32) -> Self {
        let status = self.status();
        status.replicas = Some(replicas);
        status.ready_replicas = Some(ready);
        self
    }

    pub fn condition(mut self, type_: &str, status: &str, reason: &str, message: &str) -> Self {
        self.status()
            .conditions
            .get_or_insert_with(Vec::new)
            .push(DeploymentCondition {
                type_: type_.to_string(),
                status: status.to_string(),
                reason: Some(reason.to_string()),
                message: Some(message.to_string()),
                ..Default::default()
            });
        self
    }

    pub fn build(self) -> Deployment {
        self.0
    }
}

pub struct ReplicaSetBuilder(ReplicaSet);

pub fn replica_set(namespace: &str, name: &str) -> ReplicaSetBuilder {
    ReplicaSetBuilder(ReplicaSet {
        metadata: meta(Some(namespace), name),
        ..Default::default()
    })
}

impl ReplicaSetBuilder {
    pub fn owned_by(mut self, kind: &str, name: &str) -> Self {
        add_owner(&mut self.0.metadata, owner_api_version(kind), kind, name);
        self
    }

    pub fn build(self) -> ReplicaSet {
        self.0
    }
}

pub struct PodBuilder(Pod);

pub fn pod(namespace: &str, name: &str) -> PodBuilder {
    PodBuilder(Pod {
        metadata: meta(Some(namespace), name),
        ..Default::default()
    })
}

impl PodBuilder {
    pub fn label(mut self, key: &str, value: &str) -> Self {
        add_label(&mut self.0.metadata, key, value);
        self
    }

    pub fn owned_by(mut self, kind: &str, name: &str) -> Self {
        add_owner(&mut self.0.metadata, owner_api_version(kind), kind, name);
        self
    }

    pub fn build(self) -> Pod {
        self.0
    }
}

/// Render objects as a multi-document YAML manifest
pub fn to_manifest<T: Serialize>(objects: &[T]) -> String {
    objects
        .iter()
        .map(|object| serde_yaml::to_string(object).unwrap())
        .collect::<Vec<_>>()
        .join("---\n")
}

/// Write a manifest to a temporary `.yaml` file that lives as long as the handle
pub fn manifest_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
