//! redb table definitions for the TierSync state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Composite keys follow the pattern `{namespace}/{name}`. Records
//! are iterated in key order, which gives the paged scan its stable order.

use redb::TableDefinition;

/// Tier specs keyed by `{namespace}/{name}`.
pub const TIERS: TableDefinition<&str, &[u8]> = TableDefinition::new("tiers");

/// Records keyed by `{namespace}/{name}`.
pub const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// Work items keyed by `{namespace}/{name}`.
pub const WORK_ITEMS: TableDefinition<&str, &[u8]> = TableDefinition::new("work_items");
