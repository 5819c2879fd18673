//! Findings and the references they point at

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of resource a violation is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Namespace,
    Ingress,
    Service,
    Deployment,
    Pod,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Namespace => "namespace",
            SubjectKind::Ingress => "ingress",
            SubjectKind::Service => "service",
            SubjectKind::Deployment => "deployment",
            SubjectKind::Pod => "pod",
        }
    }

    /// Plural form used in log lines and list errors
    pub fn plural(&self) -> &'static str {
        match self {
            SubjectKind::Namespace => "namespaces",
            SubjectKind::Ingress => "ingresses",
            SubjectKind::Service => "services",
            SubjectKind::Deployment => "deployments",
            SubjectKind::Pod => "pods",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of dependency a reference identifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    #[serde(rename = "service")]
    Service,
    /// A set of pods identified by label selector rather than by name
    #[serde(rename = "pod")]
    PodSelector,
    #[serde(rename = "deployment")]
    Deployment,
    #[serde(rename = "replicaset")]
    ReplicaSet,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReferenceKind::Service => "service",
            ReferenceKind::PodSelector => "pod",
            ReferenceKind::Deployment => "deployment",
            ReferenceKind::ReplicaSet => "replicaset",
        };
        f.write_str(s)
    }
}

/// Kind of an owner reference, as far as ownership walking cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerKind {
    ReplicaSet,
    Deployment,
    Other(String),
}

impl From<&str> for OwnerKind {
    fn from(kind: &str) -> Self {
        match kind {
            "ReplicaSet" => OwnerKind::ReplicaSet,
            "Deployment" => OwnerKind::Deployment,
            other => OwnerKind::Other(other.to_string()),
        }
    }
}

/// Identifies the dependency target of a finding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReference {
    pub kind: ReferenceKind,
    /// Empty when pods are identified by selector
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<String>,
}

impl ResourceReference {
    pub fn named(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            label_selector: None,
        }
    }

    pub fn service(name: impl Into<String>) -> Self {
        Self::named(ReferenceKind::Service, name)
    }

    pub fn replica_set(name: impl Into<String>) -> Self {
        Self::named(ReferenceKind::ReplicaSet, name)
    }

    pub fn deployment(name: impl Into<String>) -> Self {
        Self::named(ReferenceKind::Deployment, name)
    }

    pub fn pods(selector: impl Into<String>) -> Self {
        Self {
            kind: ReferenceKind::PodSelector,
            name: String::new(),
            label_selector: Some(selector.into()),
        }
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label_selector {
            Some(selector) => write!(f, "{} matching \"{}\"", self.kind, selector),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

/// One finding about one subject resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub subject_kind: SubjectKind,
    pub subject_name: String,
    pub namespace: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ResourceReference>,
    /// Error text from the cluster when a lookup failed for reasons other than absence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Violation {
    pub fn new(
        subject_kind: SubjectKind,
        namespace: impl Into<String>,
        subject_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            subject_kind,
            subject_name: subject_name.into(),
            namespace: namespace.into(),
            reason: reason.into(),
            reference: None,
            detail: None,
        }
    }

    pub fn with_reference(mut self, reference: ResourceReference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}: {}",
            self.subject_kind, self.namespace, self.subject_name, self.reason
        )?;
        if let Some(reference) = &self.reference {
            write!(f, " (-> {})", reference)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_kind_parsing() {
        assert_eq!(OwnerKind::from("ReplicaSet"), OwnerKind::ReplicaSet);
        assert_eq!(OwnerKind::from("Deployment"), OwnerKind::Deployment);
        assert_eq!(
            OwnerKind::from("StatefulSet"),
            OwnerKind::Other("StatefulSet".to_string())
        );
    }

    #[test]
    fn test_reference_serialization() {
        let reference = ResourceReference::pods("app=api");
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "pod", "labelSelector": "app=api"})
        );

        let reference = ResourceReference::service("cart");
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "service", "name": "cart"}));
    }

    #[test]
    fn test_violation_display() {
        let violation = Violation::new(
            SubjectKind::Ingress,
            "shop",
            "web",
            "references a missing service",
        )
        .with_reference(ResourceReference::service("cart"));

        assert_eq!(
            violation.to_string(),
            "ingress shop/web: references a missing service (-> service/cart)"
        );
    }
}
