//! Report assembly and rendering
//!
//! Flattens a finished inventory into namespace-grouped findings and renders
//! them as YAML, JSON or plain text.

use anyhow::Result;
use clap::ValueEnum;
use kube_cleanup_core::{Inventory, SubjectKind, Violation};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceReport {
    pub name: String,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub namespaces: Vec<NamespaceReport>,
}

impl From<Inventory> for Report {
    fn from(inventory: Inventory) -> Self {
        let namespaces = inventory
            .into_namespaces()
            .map(|(name, violations)| NamespaceReport { name, violations })
            .collect();
        Self { namespaces }
    }
}

fn section_title(kind: SubjectKind) -> &'static str {
    match kind {
        SubjectKind::Namespace => "Stuck Namespaces",
        SubjectKind::Ingress => "Broken Ingresses",
        SubjectKind::Service => "Broken Services",
        SubjectKind::Deployment => "Unhealthy Deployments",
        SubjectKind::Pod => "Orphaned Pods",
    }
}

const BANNER: &str = "==============================";

impl Report {
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    pub fn violation_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.violations.len()).sum()
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Yaml => serde_yaml::to_string(self)?,
            OutputFormat::Json => serde_json::to_string_pretty(self)?,
            OutputFormat::Text => self.to_text(),
        })
    }

    pub fn to_text(&self) -> String {
        if self.is_empty() {
            return "You don't have any problems, at all!\n".to_string();
        }

        let mut out = String::new();
        for namespace in &self.namespaces {
            let _ = writeln!(out, "\n{}", BANNER);
            let _ = writeln!(out, "Namespace: {}", namespace.name);
            let _ = writeln!(out, "{}", BANNER);

            let mut current = None;
            for violation in &namespace.violations {
                if current != Some(violation.subject_kind) {
                    current = Some(violation.subject_kind);
                    let _ = writeln!(out, "\n{}", section_title(violation.subject_kind));
                }

                let _ = write!(out, "* {}: {}", violation.subject_name, violation.reason);
                if let Some(reference) = &violation.reference {
                    let _ = write!(out, " (-> {})", reference);
                }
                if let Some(detail) = &violation.detail {
                    let _ = write!(out, " [{}]", detail);
                }
                out.push('\n');
            }
        }
        out
    }
}
