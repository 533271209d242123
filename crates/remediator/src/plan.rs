//! Deletion plan construction.
//!
//! Ordering is the safety invariant here: a request must be deleted before its
//! orders. Deleting an order while its stuck request still exists makes
//! cert-manager recreate a fresh order under the stale request, which hangs
//! again immediately. Per-problem blocks are emitted whole, so an interrupted
//! run never leaves an order ahead of its request.

use std::fmt::Write as _;

use crate::cluster::KindRef;
use crate::correlate::OrderIndex;
use crate::records::CertificateRequestRecord;

/// One namespaced object scheduled for deletion. Purely descriptive; exists
/// for a single run.
#[derive(Debug, Clone)]
pub struct DeletionTarget {
    pub kind: KindRef,
    pub namespace: String,
    pub name: String,
}

impl DeletionTarget {
    #[must_use]
    pub fn qualified(&self) -> String {
        self.kind.qualified(&self.name)
    }

    fn is_order(&self) -> bool {
        self.kind == KindRef::acme_orders()
    }
}

/// Ordered deletion sequence for one run. Request targets always precede the
/// order targets correlated to them, by construction.
#[derive(Debug, Default)]
pub struct RemediationPlan {
    pub targets: Vec<DeletionTarget>,
}

impl RemediationPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Render the plan for operator review. No mutation happens here.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for target in &self.targets {
            if target.is_order() {
                let _ = writeln!(out, "{:<20}\t-{}", target.namespace, target.qualified());
            } else {
                let _ = writeln!(out, "{:<20}{}", target.namespace, target.qualified());
            }
        }
        out
    }
}

/// Build the plan for a set of problematic requests.
///
/// Problems are visited in (namespace, name) order so operator review is
/// reproducible across runs. Each problem contributes its request target
/// immediately followed by every correlated order target.
#[must_use]
pub fn build_plan(
    mut problems: Vec<CertificateRequestRecord>,
    orders: &OrderIndex,
) -> RemediationPlan {
    problems.sort_by(|a, b| {
        a.namespace
            .cmp(&b.namespace)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut plan = RemediationPlan::default();

    for problem in &problems {
        plan.targets.push(DeletionTarget {
            kind: KindRef::certificate_requests(),
            namespace: problem.namespace.clone(),
            name: problem.name.clone(),
        });

        let Some(certificate_name) = problem.certificate_name.as_deref() else {
            // No owning-certificate annotation, nothing to correlate.
            continue;
        };

        for order in orders.orders_for(certificate_name) {
            plan.targets.push(DeletionTarget {
                kind: KindRef::acme_orders(),
                namespace: order.namespace.clone(),
                name: order.name.clone(),
            });
        }
    }

    plan
}
