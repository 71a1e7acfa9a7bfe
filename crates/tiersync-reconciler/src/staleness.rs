//! Staleness detection — is a record up to date on a given cluster?

use tiersync_state::Record;

/// Whether a record needs an update on `cluster` to reach the tier's
/// current refs (identified by `current_hash`).
///
/// Stale iff the record's stored fingerprint for that cluster differs
/// from `current_hash`, or the record has no fingerprint label at all
/// while holding an account on that cluster. A record with neither a
/// label nor an account has nothing to update there.
pub fn is_stale(record: &Record, cluster: &str, current_hash: &str) -> bool {
    match record.labels(cluster) {
        Some(labels) => labels.hash != current_hash,
        None => record.account(cluster).is_some(),
    }
}
