//! `opname-recon` — stock-opname reconciliation engine.
//!
//! Pure engine crate: receives a catalog projection and scan events,
//! returns classified entries, filterable detail rows, and summary counts.
//! No CLI or file IO dependencies.

pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod ident;
pub mod ingest;
pub mod matcher;
pub mod model;
pub mod report;
pub mod session;

pub use config::{OpnameConfig, RescanPolicy};
pub use error::OpnameError;
pub use filter::FilterCriteria;
pub use model::{
    CatalogRecord, OpnameBucket, OpnameResult, OpnameSummary, ReconEntry, ScanEvent, ScanMethod,
};
pub use report::compute_summary;
pub use session::{run, OpnameSession, ScanOutcome};
