//! Pool accounting — how many work-item slots are free for a tier.
//!
//! Items with a deletion timestamp are mid-teardown and no longer hold
//! a slot. The count is advisory for a single pass: deletion is driven
//! externally, so the real count can shift between the listing and the
//! creates. Convergence across passes absorbs that drift.

use tiersync_state::WorkItem;

/// Partition of a tier's work items by lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolUsage {
    /// Items without a deletion timestamp; each holds a pool slot.
    pub live: u32,
    /// Items being torn down; their slots are already reclaimable.
    pub reclaimable: u32,
}

impl PoolUsage {
    /// Tally a tier's work items.
    pub fn tally(items: &[WorkItem]) -> Self {
        let mut usage = PoolUsage::default();
        for item in items {
            if item.is_live() {
                usage.live += 1;
            } else {
                usage.reclaimable += 1;
            }
        }
        usage
    }

    /// Free admission slots given the pool cap. Never underflows.
    pub fn remaining(&self, max_pool_size: u32) -> u32 {
        max_pool_size.saturating_sub(self.live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, deleted_at: Option<u64>) -> WorkItem {
        WorkItem {
            namespace: "host".to_string(),
            name: name.to_string(),
            tier: "basic".to_string(),
            record: name.to_string(),
            target_cluster: "cluster1".to_string(),
            created_at: 1000,
            deleted_at,
        }
    }

    #[test]
    fn empty_pool_has_full_capacity() {
        let usage = PoolUsage::tally(&[]);
        assert_eq!(usage, PoolUsage { live: 0, reclaimable: 0 });
        assert_eq!(usage.remaining(5), 5);
    }

    #[test]
    fn live_items_consume_slots() {
        let items = vec![item("a", None), item("b", None), item("c", None)];
        let usage = PoolUsage::tally(&items);
        assert_eq!(usage.live, 3);
        assert_eq!(usage.remaining(5), 2);
    }

    #[test]
    fn deleted_items_do_not_count() {
        let items = vec![item("a", None), item("b", Some(2000)), item("c", Some(2000))];
        let usage = PoolUsage::tally(&items);
        assert_eq!(usage.live, 1);
        assert_eq!(usage.reclaimable, 2);
        assert_eq!(usage.remaining(3), 2);
    }

    #[test]
    fn soft_deleting_one_item_frees_one_slot() {
        let mut items = vec![item("a", None), item("b", None), item("c", None)];
        assert_eq!(PoolUsage::tally(&items).remaining(3), 0);

        items[1].deleted_at = Some(2000);
        assert_eq!(PoolUsage::tally(&items).remaining(3), 1);
    }

    #[test]
    fn remaining_saturates_at_zero() {
        let items = vec![item("a", None), item("b", None)];
        // Overshoot (transient race) must not underflow.
        assert_eq!(PoolUsage::tally(&items).remaining(1), 0);
    }
}
