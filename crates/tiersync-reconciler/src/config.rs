//! Reconciler configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the admission scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Hard cap on live work items per tier. Creates stop the instant
    /// this many are in flight.
    pub max_pool_size: u32,
    /// Records requested per page while scanning the fleet.
    pub page_limit: u32,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_pool_size: 5,
            page_limit: 100,
        }
    }
}
