use chrono::NaiveDateTime;

use crate::model::{OpnameBucket, ReconEntry};

/// A set of optional predicates over reconciliation entries. Unset fields
/// impose no constraint; set fields combine with logical AND.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Exact classification equality.
    pub bucket: Option<OpnameBucket>,
    pub title_contains: Option<String>,
    pub code_contains: Option<String>,
    /// Matches the expected or the actual location.
    pub location_contains: Option<String>,
    pub epc_contains: Option<String>,
    /// Inclusive lower bound on the scan timestamp. Entries without a
    /// timestamp fail any set bound.
    pub scanned_from: Option<NaiveDateTime>,
    /// Inclusive upper bound on the scan timestamp.
    pub scanned_to: Option<NaiveDateTime>,
    /// `true` selects only unexpected entries, `false` only catalog-backed
    /// ones.
    pub unexpected: Option<bool>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.bucket.is_none()
            && self.title_contains.is_none()
            && self.code_contains.is_none()
            && self.location_contains.is_none()
            && self.epc_contains.is_none()
            && self.scanned_from.is_none()
            && self.scanned_to.is_none()
            && self.unexpected.is_none()
    }

    pub fn matches(&self, entry: &ReconEntry) -> bool {
        if let Some(bucket) = self.bucket {
            if entry.bucket != bucket {
                return false;
            }
        }
        if let Some(ref needle) = self.title_contains {
            if !contains_ci(entry.title.as_deref(), needle) {
                return false;
            }
        }
        if let Some(ref needle) = self.code_contains {
            if !contains_ci(entry.item_code.as_deref(), needle) {
                return false;
            }
        }
        if let Some(ref needle) = self.location_contains {
            if !contains_ci(entry.expected_location.as_deref(), needle)
                && !contains_ci(entry.actual_location.as_deref(), needle)
            {
                return false;
            }
        }
        if let Some(ref needle) = self.epc_contains {
            if !contains_ci(entry.epc.as_deref(), needle) {
                return false;
            }
        }
        if self.scanned_from.is_some() || self.scanned_to.is_some() {
            let Some(ts) = entry.scan_timestamp else {
                return false;
            };
            if let Some(from) = self.scanned_from {
                if ts < from {
                    return false;
                }
            }
            if let Some(to) = self.scanned_to {
                if ts > to {
                    return false;
                }
            }
        }
        if let Some(unexpected) = self.unexpected {
            if entry.is_catalog_backed() == unexpected {
                return false;
            }
        }
        true
    }

    /// Filter entries, preserving input order.
    pub fn apply(&self, entries: &[ReconEntry]) -> Vec<ReconEntry> {
        entries.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    match haystack {
        Some(h) => h.to_lowercase().contains(&needle.to_lowercase()),
        None => false,
    }
}
