use std::collections::{BTreeMap, HashMap};

use crate::model::{LocationCounts, OpnameBucket, OpnameSummary, ReconEntry};

/// Rollup bin for entries without any location context.
pub const NO_LOCATION: &str = "(none)";

/// Compute summary statistics from finalized entries: per-bucket counts
/// plus a per-location rollup. Catalog-backed entries bin under their
/// expected location, unexpected scans under the location they were read
/// at.
pub fn compute_summary(entries: &[ReconEntry]) -> OpnameSummary {
    let mut bucket_counts: HashMap<String, usize> = HashMap::new();
    let mut by_location: BTreeMap<String, LocationCounts> = BTreeMap::new();
    let mut found = 0;
    let mut misplaced = 0;
    let mut missing = 0;
    let mut unexpected = 0;

    for entry in entries {
        *bucket_counts.entry(entry.bucket.to_string()).or_insert(0) += 1;

        let bin = if entry.is_catalog_backed() {
            entry.expected_location.as_deref()
        } else {
            entry.actual_location.as_deref()
        }
        .unwrap_or(NO_LOCATION);
        let loc = by_location.entry(bin.to_string()).or_default();

        match entry.bucket {
            OpnameBucket::Found => {
                found += 1;
                loc.expected += 1;
                loc.found += 1;
            }
            OpnameBucket::Misplaced => {
                misplaced += 1;
                loc.expected += 1;
                loc.misplaced += 1;
            }
            OpnameBucket::Missing => {
                missing += 1;
                loc.expected += 1;
                loc.missing += 1;
            }
            OpnameBucket::Unexpected => {
                unexpected += 1;
                loc.unexpected += 1;
            }
        }
    }

    OpnameSummary {
        total_items: entries.len() - unexpected,
        found,
        misplaced,
        missing,
        unexpected,
        bucket_counts,
        by_location,
    }
}
