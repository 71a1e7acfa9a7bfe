//! Paged record scanning with a resumable cursor.

use tiersync_state::Record;
use tracing::debug;

use crate::error::ReconcileResult;
use crate::plane::ControlPlane;

/// A lazy, finite, restartable scan over the records provisioned on one
/// target cluster.
///
/// Each `next_page` call fetches at most `page_limit` records and
/// advances the cursor. The page limit is a size hint, not a guarantee:
/// the store may return fewer records than requested mid-scan, and only
/// an empty returned cursor means the scan is done. The cursor lives and
/// dies with this value — abandoning a scan mid-way costs nothing, and a
/// fresh scan always starts from the beginning.
pub struct RecordScan<'a, P: ControlPlane> {
    plane: &'a P,
    target_cluster: String,
    page_limit: u32,
    cursor: String,
    exhausted: bool,
}

impl<'a, P: ControlPlane> RecordScan<'a, P> {
    /// Start a scan over `target_cluster` from the beginning.
    pub fn new(plane: &'a P, target_cluster: &str, page_limit: u32) -> Self {
        Self {
            plane,
            target_cluster: target_cluster.to_string(),
            page_limit,
            cursor: String::new(),
            exhausted: false,
        }
    }

    /// Fetch the next page, or `None` once the scan is exhausted.
    ///
    /// Store failures propagate; the caller abandons the pass and the
    /// next triggering event restarts the scan from scratch.
    pub fn next_page(&mut self) -> ReconcileResult<Option<Vec<Record>>> {
        if self.exhausted {
            return Ok(None);
        }
        let (page, next_cursor) =
            self.plane
                .list_records(&self.target_cluster, self.page_limit, &self.cursor)?;
        self.exhausted = next_cursor.is_empty();
        debug!(
            cluster = %self.target_cluster,
            page_len = page.len(),
            exhausted = self.exhausted,
            "scanned records page"
        );
        self.cursor = next_cursor;
        Ok(Some(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePlane;
    use tiersync_state::{AccountEntry, Record};
    use std::collections::BTreeMap;

    fn record(name: &str, cluster: &str) -> Record {
        Record {
            namespace: "host".to_string(),
            name: name.to_string(),
            accounts: vec![AccountEntry {
                target_cluster: cluster.to_string(),
                namespace_refs: vec![],
                cluster_ref: None,
            }],
            tier_labels: BTreeMap::new(),
        }
    }

    #[test]
    fn scans_all_pages_in_order() {
        let plane = FakePlane::new();
        for i in 0..5 {
            plane.add_record(record(&format!("user-{i}"), "cluster1"));
        }

        let mut scan = RecordScan::new(&plane, "cluster1", 2);
        let mut seen = Vec::new();
        while let Some(page) = scan.next_page().unwrap() {
            seen.extend(page.into_iter().map(|r| r.name));
        }
        assert_eq!(seen, vec!["user-0", "user-1", "user-2", "user-3", "user-4"]);
    }

    #[test]
    fn exhausted_scan_keeps_returning_none() {
        let plane = FakePlane::new();
        plane.add_record(record("user-0", "cluster1"));

        let mut scan = RecordScan::new(&plane, "cluster1", 10);
        assert_eq!(scan.next_page().unwrap().unwrap().len(), 1);
        assert!(scan.next_page().unwrap().is_none());
        assert!(scan.next_page().unwrap().is_none());
    }

    #[test]
    fn short_page_is_not_exhaustion() {
        let plane = FakePlane::new();
        for i in 0..6 {
            plane.add_record(record(&format!("user-{i}"), "cluster1"));
        }
        // Store hands back pages of at most 2 even when 4 are requested.
        plane.clamp_page_len(2);

        let mut scan = RecordScan::new(&plane, "cluster1", 4);
        let mut seen = 0;
        while let Some(page) = scan.next_page().unwrap() {
            assert!(page.len() <= 2);
            seen += page.len();
        }
        // Every record still arrives; the short pages just mean more trips.
        assert_eq!(seen, 6);
    }

    #[test]
    fn empty_fleet_yields_one_empty_page() {
        let plane = FakePlane::new();
        let mut scan = RecordScan::new(&plane, "cluster1", 10);
        assert_eq!(scan.next_page().unwrap().unwrap().len(), 0);
        assert!(scan.next_page().unwrap().is_none());
    }

    #[test]
    fn read_failure_surfaces() {
        let plane = FakePlane::new();
        plane.add_record(record("user-0", "cluster1"));
        plane.fail_next_list();

        let mut scan = RecordScan::new(&plane, "cluster1", 10);
        assert!(scan.next_page().is_err());
    }
}
