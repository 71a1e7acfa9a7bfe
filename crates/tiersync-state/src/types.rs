//! Domain types for the TierSync state store.
//!
//! These types represent the persisted state of tiers, provisioned
//! records, and pending work items. All types are serializable to/from
//! JSON for storage in redb tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of a target cluster a record is provisioned on.
pub type ClusterName = String;

/// Name of a tier (namespace-scoped).
pub type TierName = String;

// ── Tier ──────────────────────────────────────────────────────────

/// A named template bundle: the desired state for every record that
/// references it.
///
/// Immutable per reconciliation pass — the reconciler only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierSpec {
    pub namespace: String,
    pub name: TierName,
    /// Ordered namespace template refs. A tier with an empty list is
    /// malformed.
    pub namespace_refs: Vec<String>,
    /// Cluster-scope template ref. `None` is a normal value.
    pub cluster_ref: Option<String>,
    /// Unix timestamp (seconds) when this spec was last updated.
    pub updated_at: u64,
}

// ── Record ────────────────────────────────────────────────────────

/// The template refs a record has applied for one target cluster,
/// tracked as a fingerprint side-table entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierLabels {
    /// Tier name in use at last update.
    pub tier: TierName,
    /// Fingerprint of the refs in use at last update.
    pub hash: String,
}

/// An account a record holds on one target cluster, with the embedded
/// reference set provisioned there.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountEntry {
    pub target_cluster: ClusterName,
    pub namespace_refs: Vec<String>,
    pub cluster_ref: Option<String>,
}

/// A provisioned tenant's state.
///
/// Mutated by the external update executor, never by the reconciler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub namespace: String,
    pub name: String,
    /// One entry per target cluster the tenant is provisioned on.
    pub accounts: Vec<AccountEntry>,
    /// Per-cluster tier/fingerprint labels, keyed by target cluster.
    pub tier_labels: BTreeMap<ClusterName, TierLabels>,
}

impl Record {
    /// The account entry for a target cluster, if any.
    pub fn account(&self, cluster: &str) -> Option<&AccountEntry> {
        self.accounts.iter().find(|a| a.target_cluster == cluster)
    }

    /// The tier labels recorded for a target cluster, if any.
    pub fn labels(&self, cluster: &str) -> Option<&TierLabels> {
        self.tier_labels.get(cluster)
    }
}

// ── WorkItem ──────────────────────────────────────────────────────

/// A pending request to bring one record, on one target cluster, up to
/// the current tier's references.
///
/// Created by the admission scheduler; executed and deleted by the
/// external update executor. Deletion is a soft-delete first
/// (`deleted_at` set), then removal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkItem {
    pub namespace: String,
    pub name: String,
    /// Owning tier (label used for pool accounting).
    pub tier: TierName,
    /// Record this item updates.
    pub record: String,
    pub target_cluster: ClusterName,
    /// Unix timestamp (seconds) when this item was created.
    pub created_at: u64,
    /// Set when teardown is in progress; such items no longer count
    /// against pool capacity.
    pub deleted_at: Option<u64>,
}

impl WorkItem {
    /// Whether this item still counts against the tier's pool capacity.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

// ── Table keys ────────────────────────────────────────────────────

impl TierSpec {
    /// Build the composite key for the tiers table.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl Record {
    /// Build the composite key for the records table.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl WorkItem {
    /// Build the composite key for the work items table.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Deterministic item name for a (record, cluster) pair.
    ///
    /// Re-admitting the same pair always lands on the same key, which
    /// is what makes creation idempotent under retry.
    pub fn item_name(record: &str, cluster: &str) -> String {
        format!("{record}-{cluster}")
    }
}
