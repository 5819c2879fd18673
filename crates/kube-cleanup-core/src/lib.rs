//! Dependency resolution and validation engine for kube-cleanup
//!
//! Walks the references between cluster resources (Ingress -> Service ->
//! Pods, Pod -> ReplicaSet -> Deployment) and reports the ones that are
//! broken, unreachable or stuck. Nothing is ever modified.
//!
//! # Example
//!
//! ```no_run
//! use kube_cleanup_core::{Engine, SnapshotAccessor, Silent};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut snapshot = SnapshotAccessor::new();
//! snapshot.load_file(std::path::Path::new("cluster.yaml"))?;
//!
//! let inventory = Engine::new(&snapshot).run(&mut Silent).await?;
//! for (namespace, violation) in inventory.iter() {
//!     println!("{}: {}", namespace, violation);
//! }
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod model;
pub mod selector;
pub mod snapshot;
pub mod validators;
pub mod walker;

#[cfg(feature = "kubernetes")]
pub mod kube_accessor;

pub use accessor::ResourceAccessor;
pub use engine::{Check, Engine, EngineOptions, RunObserver, Silent, DEFAULT_SYSTEM_NAMESPACE};
pub use error::{AccessError, EngineError, SnapshotError};
pub use inventory::{Inventory, RetentionPolicy};
pub use model::{ReferenceKind, ResourceReference, SubjectKind, Violation};
pub use selector::LabelSelector;
pub use snapshot::SnapshotAccessor;

#[cfg(feature = "kubernetes")]
pub use kube_accessor::KubeAccessor;
