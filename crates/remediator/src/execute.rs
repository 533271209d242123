//! Plan execution.
//!
//! Deletions run strictly in plan order with per-target error isolation: one
//! failed delete (already gone, RBAC denial, transient transport error) is
//! recorded and logged, and the rest of the plan still runs. Later problems
//! are independent and must still be remediated.

use colored::Colorize;
use tracing::{info, warn};

use crate::cluster::{ClusterOps, DeletionReceipt};
use crate::plan::{DeletionTarget, RemediationPlan};

#[derive(Debug)]
pub enum DeletionOutcome {
    Deleted(DeletionReceipt),
    Failed(String),
}

#[derive(Debug)]
pub struct DeletionResult {
    pub target: DeletionTarget,
    pub outcome: DeletionOutcome,
}

impl DeletionResult {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, DeletionOutcome::Deleted(_))
    }
}

/// Delete every target in the plan, in order, one attempt per target.
///
/// Prints one `STATUS  KIND  NAME` line per target and returns the full
/// per-target results. Never aborts early.
pub async fn execute_plan(
    cluster: &dyn ClusterOps,
    plan: &RemediationPlan,
) -> Vec<DeletionResult> {
    let mut results = Vec::with_capacity(plan.len());

    for target in &plan.targets {
        match cluster.delete_namespaced_object(target).await {
            Ok(receipt) => {
                info!(
                    namespace = %target.namespace,
                    target = %target.qualified(),
                    "Deleted"
                );
                println!(
                    "{}{:<30}{}",
                    format!("{:<15}", receipt.status).green(),
                    receipt.kind,
                    receipt.name
                );
                results.push(DeletionResult {
                    target: target.clone(),
                    outcome: DeletionOutcome::Deleted(receipt),
                });
            }
            Err(err) => {
                warn!(
                    namespace = %target.namespace,
                    target = %target.qualified(),
                    error = %err,
                    "Deletion failed, continuing with remaining targets"
                );
                println!(
                    "{}{:<30}{}",
                    format!("{:<15}", "FAILED").red(),
                    target.kind.kind,
                    target.name
                );
                results.push(DeletionResult {
                    target: target.clone(),
                    outcome: DeletionOutcome::Failed(err.to_string()),
                });
            }
        }
    }

    results
}
