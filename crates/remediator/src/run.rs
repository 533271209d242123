//! One remediation pass.
//!
//! `DISCOVER -> CLASSIFY -> CORRELATE -> PLAN -> REVIEW -> (CONFIRMED ->
//! EXECUTE -> REPORT) | (DECLINED -> REPORT)`. Every run starts fresh from
//! discovery; nothing is persisted between runs.

use chrono::{Duration, Utc};
use colored::Colorize;
use tracing::{debug, error, info, warn};

use crate::cluster::{ClusterOps, KindRef};
use crate::correlate::OrderIndex;
use crate::detect::{classify, default_minimum_age, is_stale, RequestHealth};
use crate::execute::{execute_plan, DeletionResult};
use crate::plan::build_plan;
use crate::records::{
    parse_certificate_request, parse_order, CertificateRequestRecord, OrderRecord,
};

/// Options for one remediation run.
pub struct RunOptions {
    /// Kubeconfig context name, used in operator-facing messages.
    pub cluster: String,
    /// Restrict remediation to one namespace.
    pub namespace: Option<String>,
    /// Minimum age before a problematic request is eligible.
    pub minimum_age: Duration,
}

impl RunOptions {
    #[must_use]
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            namespace: None,
            minimum_age: default_minimum_age(),
        }
    }
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum RunOutcome {
    /// Empty problem set; no further cluster calls were made.
    NoProblems,
    /// Operator declined the plan; zero mutations.
    Declined,
    /// Plan executed; per-target results in plan order.
    Executed(Vec<DeletionResult>),
}

/// Run one remediation pass against `cluster`.
///
/// `confirm` blocks for the operator's decision between plan review and
/// execution; when it returns false nothing is mutated.
pub async fn run(
    cluster: &dyn ClusterOps,
    options: &RunOptions,
    mut confirm: impl FnMut() -> bool,
) -> RunOutcome {
    let problems = discover_problems(cluster, options).await;

    if problems.is_empty() {
        println!(
            "No certificate requests problems found on {}",
            options.cluster
        );
        return RunOutcome::NoProblems;
    }

    info!(count = problems.len(), "Found problematic certificate requests");

    // Orders are only listed once at least one problem exists.
    let orders = OrderIndex::new(list_orders(cluster).await);
    let plan = build_plan(problems, &orders);

    println!("{}", "To be deleted:".bold());
    print!("{}", plan.render());

    if !confirm() {
        println!("Not doing anything, exit");
        return RunOutcome::Declined;
    }

    println!("Proceeding to delete");
    RunOutcome::Executed(execute_plan(cluster, &plan).await)
}

/// List certificate requests and reduce them to the aged problem set.
///
/// A failed listing degrades to an empty set rather than ending the run;
/// records with untrustworthy timestamps are excluded with a warning.
async fn discover_problems(
    cluster: &dyn ClusterOps,
    options: &RunOptions,
) -> Vec<CertificateRequestRecord> {
    let items = match cluster
        .list_cluster_objects(&KindRef::certificate_requests())
        .await
    {
        Ok(items) => items,
        Err(err) => {
            error!(error = %err, "Listing certificate requests failed");
            return Vec::new();
        }
    };

    let now = Utc::now();
    let mut problems = Vec::new();

    for item in &items {
        let record = match parse_certificate_request(item) {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "Skipping unparseable certificate request");
                continue;
            }
        };

        if let Some(namespace) = &options.namespace {
            if &record.namespace != namespace {
                continue;
            }
        }

        if !is_stale(record.observed_at, now, options.minimum_age) {
            debug!(
                namespace = %record.namespace,
                name = %record.name,
                "Too young for remediation, skipping"
            );
            continue;
        }

        if classify(&record) == RequestHealth::Problematic {
            debug!(
                namespace = %record.namespace,
                name = %record.name,
                status = %record.status_summary(),
                "Problematic certificate request"
            );
            problems.push(record);
        }
    }

    problems
}

async fn list_orders(cluster: &dyn ClusterOps) -> Vec<OrderRecord> {
    let items = match cluster.list_cluster_objects(&KindRef::acme_orders()).await {
        Ok(items) => items,
        Err(err) => {
            error!(error = %err, "Listing orders failed, correlating against none");
            return Vec::new();
        }
    };

    items
        .iter()
        .filter_map(|item| match parse_order(item) {
            Ok(order) => Some(order),
            Err(err) => {
                warn!(error = %err, "Skipping unparseable order");
                None
            }
        })
        .collect()
}
