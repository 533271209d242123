//! Cluster access boundary.
//!
//! Everything the remediation engine needs from Kubernetes is behind the
//! [`ClusterOps`] trait: list a custom-resource kind cluster-wide, delete one
//! namespaced object. [`KubeCluster`] is the production implementation over a
//! `kube::Client`; tests substitute a fake.

use anyhow::{Context, Result};
use async_trait::async_trait;
use kube::api::{Api, DeleteParams, DynamicObject, ListParams};
use kube::config::KubeConfigOptions;
use kube::core::response::{Status, StatusSummary};
use kube::discovery::ApiResource;
use kube::{Client, Config};
use thiserror::Error;
use tracing::{debug, warn};

use crate::plan::DeletionTarget;

/// Errors from cluster listing or deletion calls.
///
/// Non-retriable within a run: a failed listing degrades that kind to zero
/// results, a failed deletion is recorded against its target only.
#[derive(Error, Debug)]
pub enum ClusterQueryError {
    #[error("failed to list {plural}.{group}: {source}")]
    List {
        group: String,
        plural: String,
        #[source]
        source: kube::Error,
    },

    #[error("failed to delete {plural}.{group}/{name} in {namespace}: {source}")]
    Delete {
        group: String,
        plural: String,
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },
}

/// Fixed descriptor for a custom-resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindRef {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
    pub singular: &'static str,
}

impl KindRef {
    /// cert-manager `CertificateRequest` resources.
    #[must_use]
    pub fn certificate_requests() -> Self {
        Self {
            group: "cert-manager.io",
            version: "v1",
            kind: "CertificateRequest",
            plural: "certificaterequests",
            singular: "certificaterequest",
        }
    }

    /// ACME `Order` resources created by cert-manager.
    #[must_use]
    pub fn acme_orders() -> Self {
        Self {
            group: "acme.cert-manager.io",
            version: "v1",
            kind: "Order",
            plural: "orders",
            singular: "order",
        }
    }

    /// `kubectl`-style qualified name, e.g. `certificaterequest.cert-manager.io/foo`.
    #[must_use]
    pub fn qualified(&self, name: &str) -> String {
        format!("{}.{}/{}", self.singular, self.group, name)
    }

    fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.to_string(),
            version: self.version.to_string(),
            api_version: format!("{}/{}", self.group, self.version),
            kind: self.kind.to_string(),
            plural: self.plural.to_string(),
        }
    }
}

/// Response summary for a completed deletion, matching what the API server
/// reports back (`STATUS  KIND  NAME`).
#[derive(Debug, Clone)]
pub struct DeletionReceipt {
    pub status: String,
    pub kind: String,
    pub name: String,
}

/// Cluster operations the remediation engine consumes.
#[async_trait]
pub trait ClusterOps {
    /// List all objects of `kind` across the cluster as raw JSON items.
    async fn list_cluster_objects(
        &self,
        kind: &KindRef,
    ) -> Result<Vec<serde_json::Value>, ClusterQueryError>;

    /// Delete one namespaced object described by `target`.
    async fn delete_namespaced_object(
        &self,
        target: &DeletionTarget,
    ) -> Result<DeletionReceipt, ClusterQueryError>;
}

/// Production [`ClusterOps`] backed by a `kube::Client`.
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Connect using the named kubeconfig context.
    ///
    /// # Errors
    ///
    /// Returns an error if the kubeconfig cannot be loaded, the context does
    /// not exist, or the client cannot be built. This is the one fatal
    /// failure of a run.
    pub async fn connect(context: &str) -> Result<Self> {
        let options = KubeConfigOptions {
            context: Some(context.to_string()),
            ..KubeConfigOptions::default()
        };

        let config = Config::from_kubeconfig(&options)
            .await
            .with_context(|| format!("Failed to load kubeconfig context '{context}'"))?;

        let client = Client::try_from(config).context("Failed to create Kubernetes client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ClusterOps for KubeCluster {
    async fn list_cluster_objects(
        &self,
        kind: &KindRef,
    ) -> Result<Vec<serde_json::Value>, ClusterQueryError> {
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &kind.api_resource());

        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|source| ClusterQueryError::List {
                group: kind.group.to_string(),
                plural: kind.plural.to_string(),
                source,
            })?;

        debug!(kind = kind.plural, count = list.items.len(), "Listed cluster objects");

        Ok(raw_items(list.items))
    }

    async fn delete_namespaced_object(
        &self,
        target: &DeletionTarget,
    ) -> Result<DeletionReceipt, ClusterQueryError> {
        let api: Api<DynamicObject> = Api::namespaced_with(
            self.client.clone(),
            &target.namespace,
            &target.kind.api_resource(),
        );

        let response = api
            .delete(&target.name, &DeleteParams::default())
            .await
            .map_err(|source| ClusterQueryError::Delete {
                group: target.kind.group.to_string(),
                plural: target.kind.plural.to_string(),
                namespace: target.namespace.clone(),
                name: target.name.clone(),
                source,
            })?;

        // Left: deletion accepted, object returned while finalizers run.
        // Right: the API server's Status summary.
        let receipt = response.either(
            |_obj| DeletionReceipt {
                status: "DELETING".to_string(),
                kind: target.kind.kind.to_string(),
                name: target.name.clone(),
            },
            |status| receipt_from_status(&status, target),
        );

        Ok(receipt)
    }
}

/// Convert listed objects to raw JSON items. An object that fails to
/// serialize is excluded with a warning, never dropped silently.
fn raw_items(items: Vec<DynamicObject>) -> Vec<serde_json::Value> {
    items
        .into_iter()
        .filter_map(|obj| match serde_json::to_value(&obj) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    name = obj.metadata.name.as_deref().unwrap_or("unknown"),
                    error = %err,
                    "Skipping object that could not be serialized"
                );
                None
            }
        })
        .collect()
}

fn receipt_from_status(status: &Status, target: &DeletionTarget) -> DeletionReceipt {
    let summary = match status.status {
        Some(StatusSummary::Success) => "SUCCESS",
        Some(StatusSummary::Failure) => "FAILURE",
        None => "UNKNOWN",
    };

    let (kind, name) = status.details.as_ref().map_or_else(
        || (target.kind.kind.to_string(), target.name.clone()),
        |details| (details.kind.clone(), details.name.clone()),
    );

    DeletionReceipt {
        status: summary.to_string(),
        kind,
        name,
    }
}
