//! Remediation engine for stuck cert-manager issuance resources.
//!
//! A `CertificateRequest` that never reports status, or reports a failed
//! condition, leaves its paired ACME `Order` hanging; cert-manager will not
//! recover the pair on its own. This crate discovers such requests
//! cluster-wide, correlates their orders through the
//! `cert-manager.io/certificate-name` annotation, and deletes each pair
//! request-first so the controller regenerates both cleanly.

pub mod cluster;
pub mod correlate;
pub mod detect;
pub mod execute;
pub mod plan;
pub mod records;
pub mod run;

pub use cluster::{ClusterOps, ClusterQueryError, DeletionReceipt, KindRef, KubeCluster};
pub use detect::DEFAULT_MINIMUM_AGE_MINUTES;
pub use execute::{DeletionOutcome, DeletionResult};
pub use plan::{DeletionTarget, RemediationPlan};
pub use run::{run, RunOptions, RunOutcome};
