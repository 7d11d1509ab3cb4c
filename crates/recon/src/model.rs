use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp format used in scan CSVs and filter bounds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ---------------------------------------------------------------------------
// Catalog input
// ---------------------------------------------------------------------------

/// Expected shelf status of a catalog item at the time of the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedStatus {
    Available,
    OnLoan,
    Repair,
    Reference,
}

impl ExpectedStatus {
    /// Parse a status cell. Case-insensitive; empty means `Available`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "available" => Some(Self::Available),
            "on_loan" | "on loan" => Some(Self::OnLoan),
            "repair" => Some(Self::Repair),
            "reference" => Some(Self::Reference),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExpectedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::OnLoan => write!(f, "on_loan"),
            Self::Repair => write!(f, "repair"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

/// Authoritative description of one physical item expected at a location.
/// Read-only during a scan session.
#[derive(Debug, Clone)]
pub struct CatalogRecord {
    pub item_code: String,
    pub epc: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub status: ExpectedStatus,
}

// ---------------------------------------------------------------------------
// Scan input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMethod {
    Rfid,
    Barcode,
}

impl ScanMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rfid" => Some(Self::Rfid),
            "barcode" => Some(Self::Barcode),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScanMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rfid => write!(f, "rfid"),
            Self::Barcode => write!(f, "barcode"),
        }
    }
}

/// Signal-strength-derived radar reading attached to an RFID read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpatialReading {
    pub distance_m: f64,
    pub angle_deg: f64,
}

/// One accepted read of an item identifier during a session.
/// Immutable once recorded.
#[derive(Debug, Clone)]
pub struct ScanEvent {
    /// EPC hex string (RFID) or barcode payload.
    pub identifier: String,
    pub method: ScanMethod,
    pub timestamp: NaiveDateTime,
    /// Shelf/zone context, when the reader carries one.
    pub location: Option<String>,
    pub spatial: Option<SpatialReading>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpnameBucket {
    /// Matched; location agrees or no location context on either side.
    Found,
    /// Matched, but the scan location disagrees with the expected location.
    Misplaced,
    /// Never matched by any scan in the session.
    Missing,
    /// Scanned identifier with no catalog counterpart.
    Unexpected,
}

impl std::fmt::Display for OpnameBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Found => write!(f, "found"),
            Self::Misplaced => write!(f, "misplaced"),
            Self::Missing => write!(f, "missing"),
            Self::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// One finalized reconciliation row: catalog fields joined with the scan
/// observation that matched it, if any.
///
/// For unexpected entries the scanned identifier lands in `epc` (RFID
/// reads) or `item_code` (barcode reads); all other catalog fields are
/// absent.
#[derive(Debug, Clone, Serialize)]
pub struct ReconEntry {
    pub bucket: OpnameBucket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<ExpectedStatus>,
    /// `true` iff a scan matched this catalog entry during the session.
    /// Always `false` for unexpected entries, which have no catalog
    /// identity to reconcile.
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_timestamp: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_method: Option<ScanMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spatial: Option<SpatialReading>,
}

impl ReconEntry {
    /// Whether this entry projects a catalog record, as opposed to a
    /// synthetic unexpected-scan entry.
    pub fn is_catalog_backed(&self) -> bool {
        self.bucket != OpnameBucket::Unexpected
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

/// Per-location breakdown. Catalog-backed entries are binned under their
/// expected location; unexpected scans under the location they were read at.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LocationCounts {
    pub expected: usize,
    pub found: usize,
    pub misplaced: usize,
    pub missing: usize,
    pub unexpected: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpnameSummary {
    /// Catalog size (unexpected entries excluded).
    pub total_items: usize,
    pub found: usize,
    pub misplaced: usize,
    pub missing: usize,
    pub unexpected: usize,
    pub bucket_counts: HashMap<String, usize>,
    pub by_location: BTreeMap<String, LocationCounts>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpnameMeta {
    pub config_name: String,
    pub policy: crate::config::RescanPolicy,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpnameResult {
    pub meta: OpnameMeta,
    pub summary: OpnameSummary,
    pub entries: Vec<ReconEntry>,
}
