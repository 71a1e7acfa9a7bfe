//! tiersync-reconciler — capacity-bound admission of tier update work.
//!
//! Keeps a fleet of provisioned records converging on their tier's
//! current template refs while never holding more than `max_pool_size`
//! update work items in flight per tier. The reconciler only reads
//! state and creates work items; executing an item (and deleting it,
//! which frees its pool slot) belongs to an external process.
//!
//! # Architecture
//!
//! ```text
//! TierEvents ──► ReconcileRunner (single-flight per tier key)
//!                  └── TierReconciler::reconcile(tier_key)
//!                        ├── PoolUsage (free slots from work items)
//!                        ├── RecordScan (cursor-paged fleet scan)
//!                        ├── is_stale (fingerprint label comparison)
//!                        └── AdmissionPass (create up to `remaining`)
//! ```
//!
//! A pass carries no durable state: the scan cursor is pass-local and a
//! fresh pass always starts from the beginning, so crashing or
//! abandoning a pass mid-way is always safe.

pub mod admission;
pub mod config;
pub mod driver;
pub mod error;
pub mod fingerprint;
pub mod plane;
pub mod pool;
pub mod runner;
pub mod scanner;
pub mod staleness;

#[cfg(test)]
pub(crate) mod testing;

pub use admission::{AdmissionPass, PassSummary};
pub use config::ReconcilerConfig;
pub use driver::TierReconciler;
pub use error::{ReconcileError, ReconcileResult};
pub use plane::ControlPlane;
pub use pool::PoolUsage;
pub use runner::{ReconcileRunner, TierEvents};
pub use scanner::RecordScan;
pub use staleness::is_stale;
