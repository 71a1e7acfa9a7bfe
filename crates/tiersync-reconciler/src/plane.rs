//! Control-plane boundary — what the reconciler needs from the store.
//!
//! The reconciler only ever reads tiers, records, and work items, and
//! writes work items through the idempotent create. Everything else
//! (executing work items, mutating records, connecting to clusters) is
//! someone else's job. Keeping the surface behind a trait lets tests
//! script page shapes and failures without a real database.

use tiersync_state::{Record, StateResult, StateStore, TierSpec, WorkItem};

/// Store operations the reconciler depends on.
pub trait ControlPlane {
    /// Look up a tier by its `{namespace}/{name}` key.
    fn get_tier(&self, key: &str) -> StateResult<Option<TierSpec>>;

    /// One page of records provisioned on `target_cluster`, resuming
    /// from `cursor` (empty = start). The returned cursor is empty once
    /// the scan is exhausted; a short page alone means nothing.
    fn list_records(
        &self,
        target_cluster: &str,
        limit: u32,
        cursor: &str,
    ) -> StateResult<(Vec<Record>, String)>;

    /// All work items owned by a tier.
    fn list_work_items(&self, tier: &str) -> StateResult<Vec<WorkItem>>;

    /// Create a work item unless its key already exists. Returns false
    /// for "already exists", which callers treat as successful admission.
    fn create_work_item(&self, item: &WorkItem) -> StateResult<bool>;

    /// All tier keys (for the periodic resync sweep).
    fn list_tier_keys(&self) -> StateResult<Vec<String>>;
}

impl ControlPlane for StateStore {
    fn get_tier(&self, key: &str) -> StateResult<Option<TierSpec>> {
        StateStore::get_tier(self, key)
    }

    fn list_records(
        &self,
        target_cluster: &str,
        limit: u32,
        cursor: &str,
    ) -> StateResult<(Vec<Record>, String)> {
        StateStore::list_records(self, target_cluster, limit, cursor)
    }

    fn list_work_items(&self, tier: &str) -> StateResult<Vec<WorkItem>> {
        StateStore::list_work_items(self, tier)
    }

    fn create_work_item(&self, item: &WorkItem) -> StateResult<bool> {
        StateStore::create_work_item(self, item)
    }

    fn list_tier_keys(&self) -> StateResult<Vec<String>> {
        StateStore::list_tier_keys(self)
    }
}
