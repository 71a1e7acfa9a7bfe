//! Admission scheduling — the capacity-bound core of a pass.
//!
//! One pass walks the fleet cluster by cluster, page by page, and
//! creates a work item for every stale record it meets until the pool
//! budget runs out. The budget is computed once up front; if it is
//! already zero the pass ends before a single record is read. Records
//! left unexamined when the budget empties are not an error — the next
//! pass (triggered by a work item's deletion) picks them up.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use tiersync_state::{TierSpec, WorkItem};

use crate::config::ReconcilerConfig;
use crate::error::ReconcileResult;
use crate::fingerprint;
use crate::plane::ControlPlane;
use crate::pool::PoolUsage;
use crate::scanner::RecordScan;
use crate::staleness::is_stale;

/// What one reconciliation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassSummary {
    /// Work items actually created this pass.
    pub created: u32,
    /// Admissions that hit an already-existing item (counted against
    /// the budget, not created).
    pub already_admitted: u32,
    /// Whether the pass stopped because the budget emptied before the
    /// fleet was fully scanned.
    pub capacity_exhausted: bool,
}

/// A single admission pass over one tier.
pub struct AdmissionPass<'a, P: ControlPlane> {
    plane: &'a P,
    config: &'a ReconcilerConfig,
}

impl<'a, P: ControlPlane> AdmissionPass<'a, P> {
    pub fn new(plane: &'a P, config: &'a ReconcilerConfig) -> Self {
        Self { plane, config }
    }

    /// Run the pass. `clusters` must already be in the deterministic
    /// iteration order (the driver sorts them once).
    ///
    /// Never blocks on work-item execution; the only writes are
    /// idempotent creates, so an aborted pass needs no unwinding.
    pub fn run(&self, tier: &TierSpec, clusters: &[String]) -> ReconcileResult<PassSummary> {
        let items = self.plane.list_work_items(&tier.name)?;
        let usage = PoolUsage::tally(&items);
        let mut remaining = usage.remaining(self.config.max_pool_size);

        if remaining == 0 {
            // Full pool: skip the fleet scan entirely.
            debug!(
                tier = %tier.name,
                live = usage.live,
                reclaimable = usage.reclaimable,
                "pool full, skipping scan"
            );
            return Ok(PassSummary {
                capacity_exhausted: true,
                ..PassSummary::default()
            });
        }

        let current_hash = fingerprint::tier_hash(tier);
        let mut summary = PassSummary::default();

        'clusters: for cluster in clusters {
            let mut scan = RecordScan::new(self.plane, cluster, self.config.page_limit);
            while let Some(page) = scan.next_page()? {
                for record in &page {
                    if !is_stale(record, cluster, &current_hash) {
                        continue;
                    }
                    let item = WorkItem {
                        namespace: tier.namespace.clone(),
                        name: WorkItem::item_name(&record.name, cluster),
                        tier: tier.name.clone(),
                        record: record.name.clone(),
                        target_cluster: cluster.clone(),
                        created_at: epoch_secs(),
                        deleted_at: None,
                    };
                    if self.plane.create_work_item(&item)? {
                        summary.created += 1;
                        info!(
                            tier = %tier.name,
                            record = %record.name,
                            cluster = %cluster,
                            "work item created"
                        );
                    } else {
                        // A previous pass got here first; the existing
                        // item stands and the admission still counts.
                        summary.already_admitted += 1;
                        debug!(
                            tier = %tier.name,
                            record = %record.name,
                            cluster = %cluster,
                            "work item already exists"
                        );
                    }
                    remaining -= 1;
                    if remaining == 0 {
                        summary.capacity_exhausted = true;
                        break 'clusters;
                    }
                }
            }
        }

        info!(
            tier = %tier.name,
            created = summary.created,
            exhausted = summary.capacity_exhausted,
            "admission pass finished"
        );
        Ok(summary)
    }
}

/// Current Unix epoch in seconds.
pub(crate) fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
