//! Per-namespace accumulation of findings
//!
//! An [`Inventory`] is built fresh for every run. Validators hand back the
//! findings for one resource and the caller records them; inventories from
//! different entry points are combined with [`Inventory::merge`].

use crate::model::{SubjectKind, Violation};
use std::collections::BTreeMap;

/// How many findings are kept for a single subject
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Every distinct finding, in the order it was detected
    #[default]
    KeepAll,
    /// Only the most recent finding replaces whatever was there before
    LatestOnly,
}

/// Identifies a subject within one namespace
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InventoryKey {
    pub kind: SubjectKind,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    policy: RetentionPolicy,
    namespaces: BTreeMap<String, BTreeMap<InventoryKey, Vec<Violation>>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            namespaces: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    pub fn record(&mut self, violation: Violation) {
        let key = InventoryKey {
            kind: violation.subject_kind,
            name: violation.subject_name.clone(),
        };
        let findings = self
            .namespaces
            .entry(violation.namespace.clone())
            .or_default()
            .entry(key)
            .or_default();

        match self.policy {
            RetentionPolicy::KeepAll => {
                if !findings.contains(&violation) {
                    findings.push(violation);
                }
            }
            RetentionPolicy::LatestOnly => {
                findings.clear();
                findings.push(violation);
            }
        }
    }

    pub fn record_all(&mut self, violations: impl IntoIterator<Item = Violation>) {
        for violation in violations {
            self.record(violation);
        }
    }

    /// Fold another inventory into this one, applying this inventory's policy
    pub fn merge(&mut self, other: Inventory) {
        for (_, subjects) in other.namespaces {
            for (_, findings) in subjects {
                self.record_all(findings);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Total number of retained findings
    pub fn len(&self) -> usize {
        self.namespaces
            .values()
            .flat_map(|subjects| subjects.values())
            .map(Vec::len)
            .sum()
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Findings for one subject, oldest first
    pub fn get(&self, namespace: &str, kind: SubjectKind, name: &str) -> &[Violation] {
        let key = InventoryKey {
            kind,
            name: name.to_string(),
        };
        self.namespaces
            .get(namespace)
            .and_then(|subjects| subjects.get(&key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All findings in one namespace, ordered by subject kind and name
    pub fn in_namespace(&self, namespace: &str) -> Vec<&Violation> {
        self.namespaces
            .get(namespace)
            .map(|subjects| subjects.values().flatten().collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Violation)> {
        self.namespaces.iter().flat_map(|(namespace, subjects)| {
            subjects
                .values()
                .flatten()
                .map(move |violation| (namespace.as_str(), violation))
        })
    }

    /// Consume the inventory, yielding each namespace with its findings
    pub fn into_namespaces(self) -> impl Iterator<Item = (String, Vec<Violation>)> {
        self.namespaces.into_iter().map(|(namespace, subjects)| {
            (namespace, subjects.into_values().flatten().collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceReference;
    use pretty_assertions::assert_eq;

    fn ingress_finding(name: &str, reason: &str) -> Violation {
        Violation::new(SubjectKind::Ingress, "shop", name, reason)
    }

    #[test]
    fn test_keep_all_retains_distinct_findings_in_order() {
        let mut inventory = Inventory::new();
        inventory.record(ingress_finding("web", "no HTTP routes in ingress"));
        inventory.record(
            ingress_finding("web", "references a missing service")
                .with_reference(ResourceReference::service("cart")),
        );

        let reasons: Vec<_> = inventory
            .get("shop", SubjectKind::Ingress, "web")
            .iter()
            .map(|v| v.reason.as_str())
            .collect();
        assert_eq!(
            reasons,
            vec!["no HTTP routes in ingress", "references a missing service"]
        );
    }

    #[test]
    fn test_keep_all_drops_exact_duplicates() {
        let mut inventory = Inventory::new();
        inventory.record(ingress_finding("web", "no HTTP routes in ingress"));
        inventory.record(ingress_finding("web", "no HTTP routes in ingress"));

        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn test_latest_only_replaces() {
        let mut inventory = Inventory::with_policy(RetentionPolicy::LatestOnly);
        inventory.record(ingress_finding("web", "no HTTP routes in ingress"));
        inventory.record(ingress_finding("web", "backing workload contains no pods"));

        let findings = inventory.get("shop", SubjectKind::Ingress, "web");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].reason, "backing workload contains no pods");
    }

    #[test]
    fn test_same_name_different_kinds_do_not_collide() {
        let mut inventory = Inventory::with_policy(RetentionPolicy::LatestOnly);
        inventory.record(Violation::new(SubjectKind::Service, "shop", "api", "no selector"));
        inventory.record(Violation::new(
            SubjectKind::Deployment,
            "shop",
            "api",
            "no replicas are ready",
        ));

        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.in_namespace("shop").len(), 2);
    }

    #[test]
    fn test_merge_combines_namespaces() {
        let mut first = Inventory::new();
        first.record(ingress_finding("web", "no HTTP routes in ingress"));

        let mut second = Inventory::new();
        second.record(Violation::new(
            SubjectKind::Namespace,
            "legacy",
            "legacy",
            "stuck in termination",
        ));

        first.merge(second);

        assert_eq!(first.namespaces().collect::<Vec<_>>(), vec!["legacy", "shop"]);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_empty_lookup() {
        let inventory = Inventory::new();
        assert!(inventory.is_empty());
        assert!(inventory.get("shop", SubjectKind::Pod, "x").is_empty());
        assert!(inventory.in_namespace("shop").is_empty());
    }
}
