//! Scan-session lifecycle.
//!
//! A session is the only place reconciliation entries are mutated. It is
//! created from a catalog projection (`start`), fed scan events one at a
//! time (`record_scan` takes `&mut self`, so there is exactly one
//! mutual-exclusion domain), and consumed into an immutable result
//! (`finish`). Concurrent RFID and barcode feeds share a session behind a
//! single `Mutex`; the session itself holds no interior mutability and is
//! `Send`.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::classify::classify;
use crate::config::{OpnameConfig, RescanPolicy};
use crate::error::OpnameError;
use crate::ident::{normalize_epc, normalize_item_code};
use crate::matcher::CatalogIndex;
use crate::model::{
    CatalogRecord, OpnameBucket, OpnameMeta, OpnameResult, ReconEntry, ScanEvent, ScanMethod,
    SpatialReading,
};
use crate::report::compute_summary;

/// What happened to a single scan event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// First match for this catalog entry.
    Matched { item_code: String },
    /// The entry was already found; the rescan policy decided what was kept.
    Rescan { item_code: String },
    /// No catalog counterpart; recorded (once per identifier) as unexpected.
    Unexpected { identifier: String },
}

#[derive(Debug)]
struct SessionEntry {
    record: CatalogRecord,
    found: bool,
    actual_location: Option<String>,
    scan_timestamp: Option<NaiveDateTime>,
    scan_method: Option<ScanMethod>,
    spatial: Option<SpatialReading>,
}

impl SessionEntry {
    fn new(record: CatalogRecord) -> Self {
        Self {
            record,
            found: false,
            actual_location: None,
            scan_timestamp: None,
            scan_method: None,
            spatial: None,
        }
    }

    fn observe(&mut self, event: ScanEvent) {
        self.scan_timestamp = Some(event.timestamp);
        self.scan_method = Some(event.method);
        // A read without location/spatial context keeps the earlier one.
        if event.location.is_some() {
            self.actual_location = event.location;
        }
        if event.spatial.is_some() {
            self.spatial = event.spatial;
        }
    }
}

#[derive(Debug)]
struct UnexpectedScan {
    identifier: String,
    method: ScanMethod,
    timestamp: NaiveDateTime,
    location: Option<String>,
    spatial: Option<SpatialReading>,
}

impl UnexpectedScan {
    fn observe(&mut self, event: ScanEvent) {
        self.method = event.method;
        self.timestamp = event.timestamp;
        if event.location.is_some() {
            self.location = event.location;
        }
        if event.spatial.is_some() {
            self.spatial = event.spatial;
        }
    }
}

#[derive(Debug)]
pub struct OpnameSession {
    policy: RescanPolicy,
    entries: Vec<SessionEntry>,
    index: CatalogIndex,
    unexpected: Vec<UnexpectedScan>,
    unexpected_by_id: HashMap<String, usize>,
}

impl OpnameSession {
    /// Project the catalog into an entry table (all unfound) and build the
    /// identifier index. Catalog identifiers are normalized here; empty
    /// item codes, malformed EPCs, and duplicate keys are rejected.
    pub fn start(catalog: Vec<CatalogRecord>, policy: RescanPolicy) -> Result<Self, OpnameError> {
        let mut keys: Vec<(String, Option<String>)> = Vec::with_capacity(catalog.len());
        for record in &catalog {
            let code = normalize_item_code(&record.item_code)?;
            let epc = match &record.epc {
                Some(raw) => Some(normalize_epc(raw)?),
                None => None,
            };
            keys.push((code, epc));
        }
        let index = CatalogIndex::build(keys.iter().map(|(c, e)| (c.as_str(), e.as_deref())))?;

        Ok(Self {
            policy,
            entries: catalog.into_iter().map(SessionEntry::new).collect(),
            index,
            unexpected: Vec::new(),
            unexpected_by_id: HashMap::new(),
        })
    }

    pub fn policy(&self) -> RescanPolicy {
        self.policy
    }

    /// Apply one scan event.
    ///
    /// A malformed identifier (empty, or non-hex for an RFID read) is
    /// rejected before any lookup; the session is untouched. A lookup
    /// miss is not an error: the scan is recorded as unexpected, once per
    /// normalized identifier.
    pub fn record_scan(&mut self, event: ScanEvent) -> Result<ScanOutcome, OpnameError> {
        let identifier = match event.method {
            ScanMethod::Rfid => normalize_epc(&event.identifier)?,
            ScanMethod::Barcode => normalize_item_code(&event.identifier)?,
        };

        if let Some(idx) = self.index.lookup(&identifier) {
            let entry = &mut self.entries[idx];
            if entry.found {
                if self.policy == RescanPolicy::LastWins {
                    entry.observe(event);
                }
                return Ok(ScanOutcome::Rescan { item_code: entry.record.item_code.clone() });
            }
            entry.found = true;
            entry.observe(event);
            return Ok(ScanOutcome::Matched { item_code: entry.record.item_code.clone() });
        }

        match self.unexpected_by_id.get(&identifier) {
            Some(&u) => {
                if self.policy == RescanPolicy::LastWins {
                    self.unexpected[u].observe(event);
                }
            }
            None => {
                self.unexpected_by_id.insert(identifier.clone(), self.unexpected.len());
                self.unexpected.push(UnexpectedScan {
                    identifier: identifier.clone(),
                    method: event.method,
                    timestamp: event.timestamp,
                    location: event.location,
                    spatial: event.spatial,
                });
            }
        }
        Ok(ScanOutcome::Unexpected { identifier })
    }

    /// Live projection of the entry table, catalog order first, unexpected
    /// scans appended in first-seen order.
    pub fn entries(&self) -> Vec<ReconEntry> {
        let mut out = Vec::with_capacity(self.entries.len() + self.unexpected.len());

        for e in &self.entries {
            out.push(ReconEntry {
                bucket: classify(e.found, e.record.location.as_deref(), e.actual_location.as_deref()),
                item_code: Some(e.record.item_code.clone()),
                epc: e.record.epc.clone(),
                title: e.record.title.clone(),
                expected_location: e.record.location.clone(),
                expected_status: Some(e.record.status),
                found: e.found,
                actual_location: e.actual_location.clone(),
                scan_timestamp: e.scan_timestamp,
                scan_method: e.scan_method,
                spatial: e.spatial,
            });
        }

        for u in &self.unexpected {
            let (item_code, epc) = match u.method {
                ScanMethod::Rfid => (None, Some(u.identifier.clone())),
                ScanMethod::Barcode => (Some(u.identifier.clone()), None),
            };
            out.push(ReconEntry {
                bucket: OpnameBucket::Unexpected,
                item_code,
                epc,
                title: None,
                expected_location: None,
                expected_status: None,
                found: false,
                actual_location: u.location.clone(),
                scan_timestamp: Some(u.timestamp),
                scan_method: Some(u.method),
                spatial: u.spatial,
            });
        }

        out
    }

    /// End the session. Consumes `self`, so no scan can mutate the entry
    /// table after the report is cut.
    pub fn finish(self) -> Vec<ReconEntry> {
        self.entries()
    }
}

/// Run a whole stock take: start a session over the catalog, feed every
/// scan, finalize, and attach summary + metadata.
pub fn run(
    config: &OpnameConfig,
    catalog: Vec<CatalogRecord>,
    scans: Vec<ScanEvent>,
) -> Result<OpnameResult, OpnameError> {
    let mut session = OpnameSession::start(catalog, config.policy)?;
    for event in scans {
        session.record_scan(event)?;
    }
    let entries = session.finish();
    let summary = compute_summary(&entries);

    Ok(OpnameResult {
        meta: OpnameMeta {
            config_name: config.name.clone(),
            policy: config.policy,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExpectedStatus, TIMESTAMP_FORMAT};

    fn book(code: &str, epc: Option<&str>, location: Option<&str>) -> CatalogRecord {
        CatalogRecord {
            item_code: code.into(),
            epc: epc.map(String::from),
            title: Some(format!("Title of {code}")),
            location: location.map(String::from),
            status: ExpectedStatus::Available,
        }
    }

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn rfid(epc: &str, at: &str) -> ScanEvent {
        ScanEvent {
            identifier: epc.into(),
            method: ScanMethod::Rfid,
            timestamp: ts(at),
            location: None,
            spatial: None,
        }
    }

    fn rfid_at(epc: &str, at: &str, location: &str) -> ScanEvent {
        ScanEvent {
            identifier: epc.into(),
            method: ScanMethod::Rfid,
            timestamp: ts(at),
            location: Some(location.into()),
            spatial: None,
        }
    }

    fn barcode(code: &str, at: &str) -> ScanEvent {
        ScanEvent {
            identifier: code.into(),
            method: ScanMethod::Barcode,
            timestamp: ts(at),
            location: None,
            spatial: None,
        }
    }

    #[test]
    fn match_sets_found_and_records_observation() {
        let mut session = OpnameSession::start(
            vec![book("B001", Some("E200001A"), Some("R1"))],
            RescanPolicy::FirstWins,
        )
        .unwrap();

        let outcome = session.record_scan(rfid("E200001A", "2026-08-01T10:00:00")).unwrap();
        assert_eq!(outcome, ScanOutcome::Matched { item_code: "B001".into() });

        let entries = session.finish();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].found);
        assert_eq!(entries[0].bucket, OpnameBucket::Found);
        assert_eq!(entries[0].scan_method, Some(ScanMethod::Rfid));
        assert_eq!(entries[0].scan_timestamp, Some(ts("2026-08-01T10:00:00")));
    }

    #[test]
    fn matching_is_case_and_whitespace_insensitive() {
        let mut session = OpnameSession::start(
            vec![book("b001", Some("e200001a"), None)],
            RescanPolicy::FirstWins,
        )
        .unwrap();

        let outcome = session.record_scan(rfid("  E200001A ", "2026-08-01T10:00:00")).unwrap();
        assert_eq!(outcome, ScanOutcome::Matched { item_code: "b001".into() });

        let outcome = session.record_scan(barcode(" B001 ", "2026-08-01T10:00:05")).unwrap();
        assert_eq!(outcome, ScanOutcome::Rescan { item_code: "b001".into() });
    }

    #[test]
    fn barcode_matches_on_item_code() {
        let mut session = OpnameSession::start(
            vec![book("B001", Some("E200001A"), None)],
            RescanPolicy::FirstWins,
        )
        .unwrap();

        let outcome = session.record_scan(barcode("B001", "2026-08-01T10:00:00")).unwrap();
        assert_eq!(outcome, ScanOutcome::Matched { item_code: "B001".into() });
    }

    #[test]
    fn invalid_epc_rejected_without_mutation() {
        let mut session = OpnameSession::start(
            vec![book("B001", Some("E200001A"), None)],
            RescanPolicy::FirstWins,
        )
        .unwrap();

        let err = session.record_scan(rfid("NOT-HEX!", "2026-08-01T10:00:00")).unwrap_err();
        assert!(matches!(err, OpnameError::InvalidEpc { .. }));

        let entries = session.finish();
        assert!(!entries[0].found);
        assert_eq!(entries.len(), 1, "no unexpected entry for a rejected scan");
    }

    #[test]
    fn unknown_identifier_recorded_once() {
        let mut session = OpnameSession::start(
            vec![book("B001", Some("E200001A"), None)],
            RescanPolicy::FirstWins,
        )
        .unwrap();

        let outcome = session.record_scan(rfid("FFDEAD", "2026-08-01T10:00:00")).unwrap();
        assert_eq!(outcome, ScanOutcome::Unexpected { identifier: "FFDEAD".into() });
        // Same tag read again: still one unexpected entry.
        session.record_scan(rfid("ffdead", "2026-08-01T10:00:09")).unwrap();

        let entries = session.finish();
        let unexpected: Vec<_> = entries.iter().filter(|e| !e.is_catalog_backed()).collect();
        assert_eq!(unexpected.len(), 1);
        assert_eq!(unexpected[0].epc.as_deref(), Some("FFDEAD"));
        assert_eq!(unexpected[0].bucket, OpnameBucket::Unexpected);
    }

    #[test]
    fn first_wins_keeps_original_observation() {
        let mut session = OpnameSession::start(
            vec![book("B001", Some("E200001A"), Some("R1"))],
            RescanPolicy::FirstWins,
        )
        .unwrap();

        session.record_scan(rfid_at("E200001A", "2026-08-01T10:00:00", "R1")).unwrap();
        let outcome = session.record_scan(rfid_at("E200001A", "2026-08-01T11:30:00", "R9")).unwrap();
        assert_eq!(outcome, ScanOutcome::Rescan { item_code: "B001".into() });

        let entries = session.finish();
        assert_eq!(entries[0].scan_timestamp, Some(ts("2026-08-01T10:00:00")));
        assert_eq!(entries[0].actual_location.as_deref(), Some("R1"));
        assert_eq!(entries[0].bucket, OpnameBucket::Found);
    }

    #[test]
    fn last_wins_overwrites_observation() {
        let mut session = OpnameSession::start(
            vec![book("B001", Some("E200001A"), Some("R1"))],
            RescanPolicy::LastWins,
        )
        .unwrap();

        session.record_scan(rfid_at("E200001A", "2026-08-01T10:00:00", "R1")).unwrap();
        session.record_scan(rfid_at("E200001A", "2026-08-01T11:30:00", "R9")).unwrap();

        let entries = session.finish();
        assert_eq!(entries[0].scan_timestamp, Some(ts("2026-08-01T11:30:00")));
        assert_eq!(entries[0].actual_location.as_deref(), Some("R9"));
        assert_eq!(entries[0].bucket, OpnameBucket::Misplaced);
    }

    #[test]
    fn rescan_without_location_keeps_earlier_location() {
        let mut session = OpnameSession::start(
            vec![book("B001", Some("E200001A"), Some("R1"))],
            RescanPolicy::LastWins,
        )
        .unwrap();

        session.record_scan(rfid_at("E200001A", "2026-08-01T10:00:00", "R2")).unwrap();
        session.record_scan(rfid("E200001A", "2026-08-01T11:30:00")).unwrap();

        let entries = session.finish();
        assert_eq!(entries[0].scan_timestamp, Some(ts("2026-08-01T11:30:00")));
        assert_eq!(entries[0].actual_location.as_deref(), Some("R2"));
    }

    #[test]
    fn scan_at_other_location_classified_misplaced() {
        let mut session = OpnameSession::start(
            vec![book("B001", Some("E200001A"), Some("R1"))],
            RescanPolicy::FirstWins,
        )
        .unwrap();

        session.record_scan(rfid_at("E200001A", "2026-08-01T10:00:00", "R4")).unwrap();
        let entries = session.finish();
        assert_eq!(entries[0].bucket, OpnameBucket::Misplaced);
        assert_eq!(entries[0].actual_location.as_deref(), Some("R4"));
    }

    #[test]
    fn duplicate_catalog_code_rejected_at_start() {
        let err = OpnameSession::start(
            vec![book("B001", None, None), book(" b001", None, None)],
            RescanPolicy::FirstWins,
        )
        .unwrap_err();
        assert!(matches!(err, OpnameError::DuplicateItemCode(_)));
    }

    #[test]
    fn session_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<OpnameSession>();
    }
}
