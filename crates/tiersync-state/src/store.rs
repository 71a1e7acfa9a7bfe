//! StateStore — redb-backed state persistence for TierSync.
//!
//! Provides typed operations over tiers, records, and work items. All
//! values are JSON-serialized into redb's `&[u8]` value columns. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing).
//!
//! Record listing is cursor-paged: records come back in table-key order
//! and the returned cursor is the key of the last record in the page.
//! Passing that cursor back resumes the scan strictly after it. An empty
//! returned cursor is the only exhaustion signal — a page shorter than
//! the requested limit is not.

use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(TIERS).map_err(map_err!(Table))?;
        txn.open_table(RECORDS).map_err(map_err!(Table))?;
        txn.open_table(WORK_ITEMS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Tiers ──────────────────────────────────────────────────────

    /// Insert or update a tier spec.
    pub fn put_tier(&self, spec: &TierSpec) -> StateResult<()> {
        let key = spec.table_key();
        let value = serde_json::to_vec(spec).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(TIERS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "tier stored");
        Ok(())
    }

    /// Get a tier by namespace/name key.
    pub fn get_tier(&self, key: &str) -> StateResult<Option<TierSpec>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(TIERS).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let spec: TierSpec =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(spec))
            }
            None => Ok(None),
        }
    }

    /// List all tier keys (for the periodic resync sweep).
    pub fn list_tier_keys(&self) -> StateResult<Vec<String>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(TIERS).map_err(map_err!(Table))?;
        let mut keys = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, _) = entry.map_err(map_err!(Read))?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }

    /// Delete a tier by key. Returns true if it existed.
    pub fn delete_tier(&self, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(TIERS).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "tier deleted");
        Ok(existed)
    }

    // ── Records ────────────────────────────────────────────────────

    /// Insert or update a record.
    pub fn put_record(&self, record: &Record) -> StateResult<()> {
        let key = record.table_key();
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(RECORDS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get a record by its namespace/name key.
    pub fn get_record(&self, key: &str) -> StateResult<Option<Record>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RECORDS).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: Record =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List records provisioned on a target cluster, one page at a time.
    ///
    /// `cursor` is opaque to callers: empty means "start from the
    /// beginning", anything else resumes strictly after that position.
    /// Returns the page plus the next cursor; an empty next cursor means
    /// the scan is exhausted.
    pub fn list_records(
        &self,
        target_cluster: &str,
        limit: u32,
        cursor: &str,
    ) -> StateResult<(Vec<Record>, String)> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RECORDS).map_err(map_err!(Table))?;

        let range = if cursor.is_empty() {
            table.iter().map_err(map_err!(Read))?
        } else {
            table
                .range::<&str>((Bound::Excluded(cursor), Bound::Unbounded))
                .map_err(map_err!(Read))?
        };

        let mut page = Vec::new();
        let mut last_key = String::new();
        let mut truncated = false;
        for entry in range {
            let (key, value) = entry.map_err(map_err!(Read))?;
            let record: Record =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if record.account(target_cluster).is_none() {
                continue;
            }
            last_key = key.value().to_string();
            page.push(record);
            if page.len() as u32 >= limit {
                truncated = true;
                break;
            }
        }

        // Only hand back a cursor when the scan stopped at the limit;
        // running off the end of the table is exhaustion.
        let next_cursor = if truncated { last_key } else { String::new() };
        debug!(
            cluster = target_cluster,
            returned = page.len(),
            exhausted = next_cursor.is_empty(),
            "records page listed"
        );
        Ok((page, next_cursor))
    }

    // ── Work items ─────────────────────────────────────────────────

    /// Insert or update a work item unconditionally.
    pub fn put_work_item(&self, item: &WorkItem) -> StateResult<()> {
        let key = item.table_key();
        let value = serde_json::to_vec(item).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(WORK_ITEMS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Create a work item if its key is not already taken.
    ///
    /// Returns `false` when an item with the same key already exists; the
    /// existing item is left untouched. This is the idempotent-create
    /// primitive the admission scheduler relies on.
    pub fn create_work_item(&self, item: &WorkItem) -> StateResult<bool> {
        let key = item.table_key();
        let value = serde_json::to_vec(item).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let created;
        {
            let mut table = txn.open_table(WORK_ITEMS).map_err(map_err!(Table))?;
            let exists = table.get(key.as_str()).map_err(map_err!(Read))?.is_some();
            if exists {
                created = false;
            } else {
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(map_err!(Write))?;
                created = true;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, created, "work item create attempted");
        Ok(created)
    }

    /// Get a work item by its namespace/name key.
    pub fn get_work_item(&self, key: &str) -> StateResult<Option<WorkItem>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(WORK_ITEMS).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let item: WorkItem =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    /// List all work items owned by a tier.
    pub fn list_work_items(&self, tier: &str) -> StateResult<Vec<WorkItem>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(WORK_ITEMS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let item: WorkItem =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if item.tier == tier {
                results.push(item);
            }
        }
        Ok(results)
    }

    /// Soft-delete a work item: set its deletion timestamp.
    ///
    /// Performed by the external update executor when it starts tearing
    /// an item down. Returns true if the item existed.
    pub fn mark_work_item_deleted(&self, key: &str, deleted_at: u64) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(WORK_ITEMS).map_err(map_err!(Table))?;
            let item = match table.get(key).map_err(map_err!(Read))? {
                Some(guard) => {
                    let mut item: WorkItem = serde_json::from_slice(guard.value())
                        .map_err(map_err!(Deserialize))?;
                    item.deleted_at = Some(deleted_at);
                    Some(item)
                }
                None => None,
            };
            existed = match item {
                Some(item) => {
                    let value = serde_json::to_vec(&item).map_err(map_err!(Serialize))?;
                    table
                        .insert(key, value.as_slice())
                        .map_err(map_err!(Write))?;
                    true
                }
                None => false,
            };
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }

    /// Remove a work item by key. Returns true if it existed.
    pub fn delete_work_item(&self, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(WORK_ITEMS).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "work item deleted");
        Ok(existed)
    }
}
