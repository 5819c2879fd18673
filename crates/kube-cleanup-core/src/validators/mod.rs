//! Per-kind resource validators
//!
//! Each validator looks at one resource and returns its findings in the
//! order they were detected. Validators never fail: a dependency that
//! cannot be resolved becomes a finding.

mod deployment;
mod ingress;
mod namespace;
mod pod;
mod service;

pub use deployment::validate_deployment;
pub use ingress::validate_ingress;
pub use namespace::validate_namespace;
pub use pod::validate_pod;
pub use service::validate_service;

/// Reason texts recorded on violations
pub mod reason {
    pub const STUCK_IN_TERMINATION: &str = "stuck in termination";

    pub const NO_HTTP_ROUTES: &str = "no HTTP routes in ingress";
    pub const MISSING_SERVICE: &str = "references a missing service";
    pub const NO_WORKLOADS: &str = "backing service references no workloads";
    pub const NO_PODS: &str = "backing workload contains no pods";

    pub const NO_SELECTOR: &str = "no selector";
    pub const LOAD_BALANCER_PENDING: &str = "LoadBalancer service in pending state";

    pub const SCALED_TO_ZERO: &str = "deployment scaled down to 0 replicas";
    pub const NO_LABELS: &str = "no labels on deployment";
    pub const MINIMUM_REPLICAS_UNAVAILABLE: &str = "minimum replicas unavailable, could be temporary";
    pub const NO_READY_REPLICAS: &str = "no replicas are ready";

    pub const OWNER_MISSING: &str = "owner is missing";
    pub const OWNER_OF_OWNER_MISSING: &str = "owner of the owner is missing";
    pub const NOT_OWNED: &str = "pod is not owned by anyone";
}
