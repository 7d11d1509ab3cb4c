//! Header-mapped CSV loaders for the two input roles: the catalog export
//! and the scan log. Identifier validation happens in the session, not
//! here; the loaders only shape rows.

use chrono::NaiveDateTime;

use crate::config::{CatalogSource, ScanSource};
use crate::error::OpnameError;
use crate::model::{CatalogRecord, ExpectedStatus, ScanEvent, ScanMethod, SpatialReading, TIMESTAMP_FORMAT};

const CATALOG: &str = "catalog";
const SCANS: &str = "scans";

fn header_index(headers: &[String], source: &str, name: &str) -> Result<usize, OpnameError> {
    headers.iter().position(|h| h == name).ok_or_else(|| OpnameError::MissingColumn {
        source: source.into(),
        column: name.into(),
    })
}

/// A trimmed cell, `None` when empty.
fn optional_cell(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    let value = record.get(idx?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Load catalog records, applying the configured column mapping. Mapped
/// columns must exist in the header; empty cells in optional columns
/// leave the field absent.
pub fn load_catalog_csv(data: &str, source: &CatalogSource) -> Result<Vec<CatalogRecord>, OpnameError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| OpnameError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let col = &source.columns;
    let item_code_idx = header_index(&headers, CATALOG, &col.item_code)?;
    let epc_idx = match &col.epc {
        Some(name) => Some(header_index(&headers, CATALOG, name)?),
        None => None,
    };
    let title_idx = match &col.title {
        Some(name) => Some(header_index(&headers, CATALOG, name)?),
        None => None,
    };
    let location_idx = match &col.location {
        Some(name) => Some(header_index(&headers, CATALOG, name)?),
        None => None,
    };
    let status_idx = match &col.status {
        Some(name) => Some(header_index(&headers, CATALOG, name)?),
        None => None,
    };

    let mut records = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| OpnameError::Io(e.to_string()))?;

        let item_code = record.get(item_code_idx).unwrap_or("").to_string();

        let status = match status_idx {
            Some(i) => {
                let raw = record.get(i).unwrap_or("");
                ExpectedStatus::parse(raw).ok_or_else(|| OpnameError::StatusParse {
                    source: CATALOG.into(),
                    record: item_code.clone(),
                    value: raw.into(),
                })?
            }
            None => ExpectedStatus::Available,
        };

        records.push(CatalogRecord {
            item_code,
            epc: optional_cell(&record, epc_idx),
            title: optional_cell(&record, title_idx),
            location: optional_cell(&record, location_idx),
            status,
        });
    }

    Ok(records)
}

/// Load scan events from the scan log export.
pub fn load_scan_csv(data: &str, source: &ScanSource) -> Result<Vec<ScanEvent>, OpnameError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| OpnameError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let col = &source.columns;
    let identifier_idx = header_index(&headers, SCANS, &col.identifier)?;
    let method_idx = header_index(&headers, SCANS, &col.method)?;
    let timestamp_idx = header_index(&headers, SCANS, &col.timestamp)?;
    let location_idx = match &col.location {
        Some(name) => Some(header_index(&headers, SCANS, name)?),
        None => None,
    };
    let distance_idx = match &col.distance {
        Some(name) => Some(header_index(&headers, SCANS, name)?),
        None => None,
    };
    let angle_idx = match &col.angle {
        Some(name) => Some(header_index(&headers, SCANS, name)?),
        None => None,
    };

    let mut events = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| OpnameError::Io(e.to_string()))?;

        let identifier = record.get(identifier_idx).unwrap_or("").to_string();

        let method_raw = record.get(method_idx).unwrap_or("");
        let method = ScanMethod::parse(method_raw).ok_or_else(|| OpnameError::MethodParse {
            source: SCANS.into(),
            record: identifier.clone(),
            value: method_raw.into(),
        })?;

        let timestamp_raw = record.get(timestamp_idx).unwrap_or("");
        let timestamp = NaiveDateTime::parse_from_str(timestamp_raw, TIMESTAMP_FORMAT).map_err(|_| {
            OpnameError::TimestampParse {
                source: SCANS.into(),
                record: identifier.clone(),
                value: timestamp_raw.into(),
            }
        })?;

        let spatial = match (distance_idx, angle_idx) {
            (Some(di), Some(ai)) => {
                let d_raw = record.get(di).unwrap_or("").trim();
                let a_raw = record.get(ai).unwrap_or("").trim();
                if d_raw.is_empty() && a_raw.is_empty() {
                    None
                } else {
                    let distance_m = d_raw.parse().map_err(|_| OpnameError::SpatialParse {
                        source: SCANS.into(),
                        record: identifier.clone(),
                        value: d_raw.into(),
                    })?;
                    let angle_deg = a_raw.parse().map_err(|_| OpnameError::SpatialParse {
                        source: SCANS.into(),
                        record: identifier.clone(),
                        value: a_raw.into(),
                    })?;
                    Some(SpatialReading { distance_m, angle_deg })
                }
            }
            _ => None,
        };

        events.push(ScanEvent {
            identifier,
            method,
            timestamp,
            location: optional_cell(&record, location_idx),
            spatial,
        });
    }

    Ok(events)
}
