//! Reconciler error types.

use thiserror::Error;

/// Result type alias for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors that can occur during a reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The tier definition cannot be acted on. Surfaced to the operator,
    /// never retried.
    #[error("malformed tier {tier}: {reason}")]
    MalformedTier { tier: String, reason: String },

    /// A store read or write failed. The whole pass is retried later;
    /// creates already committed stay valid.
    #[error("state store error: {0}")]
    State(#[from] tiersync_state::StateError),
}

impl ReconcileError {
    /// Whether retrying the pass can ever succeed without operator
    /// intervention.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReconcileError::MalformedTier { .. })
    }
}
