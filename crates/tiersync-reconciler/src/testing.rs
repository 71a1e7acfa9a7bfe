//! Scripted in-memory control plane for reconciler tests.
//!
//! Mimics the store's paging semantics (key order, cursor = last key,
//! empty cursor = exhausted) while letting tests count reads, clamp page
//! sizes below the requested limit, and inject read failures.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tiersync_state::{Record, StateError, StateResult, TierSpec, WorkItem};

use crate::plane::ControlPlane;

#[derive(Default)]
struct Inner {
    tiers: BTreeMap<String, TierSpec>,
    records: BTreeMap<String, Record>,
    work_items: BTreeMap<String, WorkItem>,
    record_list_calls: u32,
    page_clamp: Option<u32>,
    fail_next_list: bool,
}

#[derive(Clone)]
pub(crate) struct FakePlane {
    inner: Arc<Mutex<Inner>>,
}

impl FakePlane {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn add_tier(&self, tier: TierSpec) {
        let mut inner = self.inner.lock().unwrap();
        inner.tiers.insert(tier.table_key(), tier);
    }

    pub fn add_record(&self, record: Record) {
        let mut inner = self.inner.lock().unwrap();
        inner.records.insert(record.table_key(), record);
    }

    pub fn add_work_item(&self, item: WorkItem) {
        let mut inner = self.inner.lock().unwrap();
        inner.work_items.insert(item.table_key(), item);
    }

    /// Cap returned pages below the requested limit, as a store is
    /// allowed to do mid-scan.
    pub fn clamp_page_len(&self, max: u32) {
        self.inner.lock().unwrap().page_clamp = Some(max);
    }

    /// Make the next record listing fail with a read error.
    pub fn fail_next_list(&self) {
        self.inner.lock().unwrap().fail_next_list = true;
    }

    /// How many record pages have been read so far.
    pub fn record_list_calls(&self) -> u32 {
        self.inner.lock().unwrap().record_list_calls
    }

    /// Snapshot of all stored work items, across tiers.
    pub fn all_work_items(&self) -> Vec<WorkItem> {
        self.inner.lock().unwrap().work_items.values().cloned().collect()
    }
}

impl ControlPlane for FakePlane {
    fn get_tier(&self, key: &str) -> StateResult<Option<TierSpec>> {
        Ok(self.inner.lock().unwrap().tiers.get(key).cloned())
    }

    fn list_records(
        &self,
        target_cluster: &str,
        limit: u32,
        cursor: &str,
    ) -> StateResult<(Vec<Record>, String)> {
        let mut inner = self.inner.lock().unwrap();
        inner.record_list_calls += 1;
        if inner.fail_next_list {
            inner.fail_next_list = false;
            return Err(StateError::Read("injected list failure".to_string()));
        }

        let effective = inner.page_clamp.map_or(limit, |clamp| limit.min(clamp));
        let mut page = Vec::new();
        let mut last_key = String::new();
        let mut truncated = false;
        // Excluded("") admits every key, so the empty start cursor needs
        // no special case.
        for (key, record) in inner.records.range::<str, _>((
            std::ops::Bound::Excluded(cursor),
            std::ops::Bound::Unbounded,
        )) {
            if record.account(target_cluster).is_none() {
                continue;
            }
            last_key = key.clone();
            page.push(record.clone());
            if page.len() as u32 >= effective {
                truncated = true;
                break;
            }
        }
        let next_cursor = if truncated { last_key } else { String::new() };
        Ok((page, next_cursor))
    }

    fn list_work_items(&self, tier: &str) -> StateResult<Vec<WorkItem>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .work_items
            .values()
            .filter(|i| i.tier == tier)
            .cloned()
            .collect())
    }

    fn create_work_item(&self, item: &WorkItem) -> StateResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let key = item.table_key();
        if inner.work_items.contains_key(&key) {
            return Ok(false);
        }
        inner.work_items.insert(key, item.clone());
        Ok(true)
    }

    fn list_tier_keys(&self) -> StateResult<Vec<String>> {
        Ok(self.inner.lock().unwrap().tiers.keys().cloned().collect())
    }
}
