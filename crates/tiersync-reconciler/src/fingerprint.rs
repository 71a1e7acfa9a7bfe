//! Template-ref fingerprinting.
//!
//! A tier's ordered template refs hash to a short stable token that
//! records carry as a label. Matching token means the record is up to
//! date; anything else means stale. The hash is a pure function of the
//! ref bytes — no map iteration order, no ambient state — so it is
//! stable across restarts and across implementations.

use sha2::{Digest, Sha256};
use tiersync_state::TierSpec;

/// Compute the fingerprint of an ordered template-ref set.
///
/// Each namespace ref is terminated by a newline before hashing, so
/// `["a", "b"]` and `["ab"]` cannot collide. An absent cluster-scope
/// ref hashes as the empty string — a normal input value, not an error.
pub fn template_refs_hash(namespace_refs: &[String], cluster_ref: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    for r in namespace_refs {
        hasher.update(r.as_bytes());
        hasher.update(b"\n");
    }
    hasher.update(cluster_ref.unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint of a tier's current refs.
pub fn tier_hash(tier: &TierSpec) -> String {
    template_refs_hash(&tier.namespace_refs, tier.cluster_ref.as_deref())
}
