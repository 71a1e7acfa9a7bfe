//! Event-driven reconcile runner.
//!
//! The runner owns the trigger surface: anything that changes a tier's
//! world (the tier spec itself, a record's fingerprint label, a work
//! item's lifecycle) reduces to "reconcile this tier key" on a channel.
//! Passes for different tiers run concurrently; passes for the same
//! tier are single-flight, serialized behind a per-key mutex. A
//! periodic sweep re-triggers every known tier as a backstop against
//! missed events.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::driver::TierReconciler;
use crate::plane::ControlPlane;

/// Handle for requesting reconciliation of a tier key.
///
/// Cheap to clone; safe to call from any task. Triggers after shutdown
/// are silently dropped.
#[derive(Clone)]
pub struct TierEvents {
    tx: mpsc::UnboundedSender<String>,
}

impl TierEvents {
    /// Queue a reconciliation pass for `tier_key`.
    pub fn trigger(&self, tier_key: &str) {
        // A closed channel just means the runner is gone.
        let _ = self.tx.send(tier_key.to_string());
    }
}

/// Runs reconciliation passes in response to tier events.
pub struct ReconcileRunner<P: ControlPlane + Send + Sync + 'static> {
    reconciler: Arc<TierReconciler<P>>,
    events: TierEvents,
    rx: mpsc::UnboundedReceiver<String>,
    /// Per-tier single-flight locks.
    locks: Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>,
    /// Keys with a pass queued or running; duplicate triggers for these
    /// are dropped.
    pending: Arc<StdMutex<HashSet<String>>>,
    retry_backoff: Duration,
    resync_interval: Duration,
}

impl<P: ControlPlane + Send + Sync + 'static> ReconcileRunner<P> {
    /// Create a runner around a reconciler. Returns the runner plus the
    /// event handle that feeds it.
    pub fn new(
        reconciler: TierReconciler<P>,
        retry_backoff: Duration,
        resync_interval: Duration,
    ) -> (Self, TierEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        let events = TierEvents { tx };
        let runner = Self {
            reconciler: Arc::new(reconciler),
            events: events.clone(),
            rx,
            locks: Arc::new(StdMutex::new(HashMap::new())),
            pending: Arc::new(StdMutex::new(HashSet::new())),
            retry_backoff,
            resync_interval,
        };
        (runner, events)
    }

    /// Run the event loop until `shutdown` flips.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            resync_secs = self.resync_interval.as_secs(),
            "reconcile runner started"
        );
        let mut resync = tokio::time::interval(self.resync_interval);

        loop {
            tokio::select! {
                Some(key) = self.rx.recv() => {
                    self.dispatch(key);
                }
                _ = resync.tick() => {
                    self.resync();
                }
                _ = shutdown.changed() => {
                    info!("reconcile runner shutting down");
                    break;
                }
            }
        }
    }

    /// Spawn a pass for one tier key, serialized per key.
    ///
    /// A key with a pass already queued or running absorbs the trigger:
    /// the pending pass reads current state when it runs, so a second
    /// pass would only repeat the same scan.
    fn dispatch(&self, key: String) {
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            if !pending.insert(key.clone()) {
                debug!(%key, "pass already pending, trigger absorbed");
                return;
            }
        }
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let reconciler = self.reconciler.clone();
        let events = self.events.clone();
        let pending = self.pending.clone();
        let backoff = self.retry_backoff;

        tokio::spawn(async move {
            let result = {
                let _guard = lock.lock().await;
                let result = reconciler.reconcile(&key);
                // From here on a fresh trigger queues a new pass.
                pending
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&key);
                result
            };
            match result {
                Ok(summary) => {
                    debug!(
                        %key,
                        created = summary.created,
                        exhausted = summary.capacity_exhausted,
                        "pass done"
                    );
                }
                Err(e) if e.is_fatal() => {
                    // Operator attention needed; retrying cannot fix it.
                    error!(%key, error = %e, "pass failed with config error");
                }
                Err(e) => {
                    warn!(%key, error = %e, "pass failed, will retry");
                    // The single-flight guard is released; the wait
                    // blocks nobody.
                    tokio::time::sleep(backoff).await;
                    events.trigger(&key);
                }
            }
        });
    }

    /// Re-trigger every known tier, dropping lock entries for tiers
    /// that no longer exist.
    fn resync(&self) {
        match self.reconciler.tier_keys() {
            Ok(keys) => {
                debug!(tiers = keys.len(), "resync sweep");
                {
                    // A pending key keeps its lock even if the tier is
                    // gone; it is swept once the pass settles.
                    let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
                    let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
                    locks.retain(|k, _| pending.contains(k) || keys.contains(k));
                }
                for key in keys {
                    self.events.trigger(&key);
                }
            }
            Err(e) => warn!(error = %e, "resync sweep failed to list tiers"),
        }
    }
}
