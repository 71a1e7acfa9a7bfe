//! Reconcile driver — entry point for one tier's pass.

use tracing::debug;

use tiersync_state::TierSpec;

use crate::admission::{AdmissionPass, PassSummary};
use crate::config::ReconcilerConfig;
use crate::error::{ReconcileError, ReconcileResult};
use crate::plane::ControlPlane;

/// Drives reconciliation passes: loads the tier, validates it, and
/// hands off to the admission scheduler.
///
/// Holds the set of target clusters the deployment spans (injected at
/// construction, sorted once so every pass iterates them in the same
/// order). One value serves all tiers; a pass carries no state across
/// invocations.
pub struct TierReconciler<P: ControlPlane> {
    plane: P,
    clusters: Vec<String>,
    config: ReconcilerConfig,
}

impl<P: ControlPlane> TierReconciler<P> {
    /// Create a reconciler over `plane` targeting `clusters`.
    pub fn new(plane: P, mut clusters: Vec<String>, config: ReconcilerConfig) -> Self {
        clusters.sort();
        clusters.dedup();
        Self {
            plane,
            clusters,
            config,
        }
    }

    /// Run one pass for the tier at `tier_key` (`{namespace}/{name}`).
    ///
    /// A vanished tier is a terminal no-op, not an error: the deletion
    /// event that triggered this pass needs nothing done. A malformed
    /// tier is fatal for its pass; a store failure is transient and the
    /// caller requeues the key.
    pub fn reconcile(&self, tier_key: &str) -> ReconcileResult<PassSummary> {
        let tier = match self.plane.get_tier(tier_key)? {
            Some(tier) => tier,
            None => {
                debug!(key = %tier_key, "tier gone, nothing to reconcile");
                return Ok(PassSummary::default());
            }
        };
        validate(&tier)?;

        AdmissionPass::new(&self.plane, &self.config).run(&tier, &self.clusters)
    }

    /// All tier keys currently in the store (for the resync sweep).
    pub fn tier_keys(&self) -> ReconcileResult<Vec<String>> {
        Ok(self.plane.list_tier_keys()?)
    }
}

/// Reject tiers the admission pass cannot act on.
fn validate(tier: &TierSpec) -> ReconcileResult<()> {
    if tier.namespace_refs.is_empty() {
        return Err(ReconcileError::MalformedTier {
            tier: tier.name.clone(),
            reason: "no namespace template refs".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePlane;
    use std::collections::BTreeMap;
    use tiersync_state::{AccountEntry, Record, TierLabels};

    fn tier(name: &str, suffix: &str) -> TierSpec {
        TierSpec {
            namespace: "host".to_string(),
            name: name.to_string(),
            namespace_refs: vec![
                format!("{name}-code-{suffix}"),
                format!("{name}-dev-{suffix}"),
            ],
            cluster_ref: Some(format!("{name}-clusterresources-123456a")),
            updated_at: 1000,
        }
    }

    fn stale_record(name: &str, cluster: &str) -> Record {
        let mut tier_labels = BTreeMap::new();
        tier_labels.insert(
            cluster.to_string(),
            TierLabels {
                tier: "basic".to_string(),
                hash: "outdated".to_string(),
            },
        );
        Record {
            namespace: "host".to_string(),
            name: name.to_string(),
            accounts: vec![AccountEntry {
                target_cluster: cluster.to_string(),
                namespace_refs: vec!["basic-code-old".to_string()],
                cluster_ref: None,
            }],
            tier_labels,
        }
    }

    fn reconciler(plane: FakePlane) -> TierReconciler<FakePlane> {
        TierReconciler::new(
            plane,
            vec!["cluster2".to_string(), "cluster1".to_string()],
            ReconcilerConfig::default(),
        )
    }

    #[test]
    fn missing_tier_is_a_terminal_noop() {
        let plane = FakePlane::new();
        let r = reconciler(plane);

        let summary = r.reconcile("host/gone").unwrap();
        assert_eq!(summary, PassSummary::default());
    }

    #[test]
    fn malformed_tier_is_fatal() {
        let plane = FakePlane::new();
        let mut bad = tier("basic", "123456a");
        bad.namespace_refs.clear();
        plane.add_tier(bad);

        let r = reconciler(plane);
        let err = r.reconcile("host/basic").unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, ReconcileError::MalformedTier { .. }));
    }

    #[test]
    fn store_failure_is_transient() {
        let plane = FakePlane::new();
        plane.add_tier(tier("basic", "123456a"));
        plane.add_record(stale_record("user-1", "cluster1"));
        plane.fail_next_list();

        let r = reconciler(plane);
        let err = r.reconcile("host/basic").unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn creates_items_for_stale_records() {
        let plane = FakePlane::new();
        plane.add_tier(tier("basic", "123456a"));
        plane.add_record(stale_record("user-1", "cluster1"));
        plane.add_record(stale_record("user-2", "cluster1"));

        let r = reconciler(plane);
        let summary = r.reconcile("host/basic").unwrap();
        assert_eq!(summary.created, 2);
    }

    #[test]
    fn clusters_are_sorted_and_deduped() {
        let plane = FakePlane::new();
        let r = TierReconciler::new(
            plane,
            vec![
                "cluster2".to_string(),
                "cluster1".to_string(),
                "cluster1".to_string(),
            ],
            ReconcilerConfig::default(),
        );
        assert_eq!(r.clusters, vec!["cluster1", "cluster2"]);
    }
}
