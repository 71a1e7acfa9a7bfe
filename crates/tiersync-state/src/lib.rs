//! tiersync-state — embedded state store for TierSync.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! state management for tiers, provisioned records, and update work items.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Composite keys (`{namespace}/{name}`) give record scans a stable key
//! order, which is what the paged listing's resumable cursor is built on.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
