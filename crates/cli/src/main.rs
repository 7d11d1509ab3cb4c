// opname CLI - config-driven library stock-take reconciliation

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{
    EXIT_ERROR, EXIT_OPNAME_DISCREPANCY, EXIT_OPNAME_INVALID_CONFIG, EXIT_OPNAME_RUNTIME,
    EXIT_OPNAME_UNEXPECTED, EXIT_SUCCESS, EXIT_USAGE,
};

use opname_recon::config::OpnameConfig;
use opname_recon::filter::FilterCriteria;
use opname_recon::ingest::{load_catalog_csv, load_scan_csv};
use opname_recon::model::{OpnameBucket, TIMESTAMP_FORMAT};
use opname_recon::session::run;

#[derive(Parser)]
#[command(name = "opname")]
#[command(about = "Library stock-take reconciliation over RFID/barcode scan logs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a stock take from a TOML config file
    #[command(after_help = "\
Examples:
  opname run stock-take.opname.toml
  opname run stock-take.opname.toml --json
  opname run stock-take.opname.toml --output report.json
  opname run stock-take.opname.toml --json --bucket missing
  opname run stock-take.opname.toml --json --unexpected --location r2
  opname run stock-take.opname.toml --json --from 2026-08-01T09:00:00")]
    Run {
        /// Path to the .opname.toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of human summary only
        #[arg(long)]
        json: bool,

        /// Write JSON output to file (overrides [output].json in the config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Keep only entries in this bucket (found, misplaced, missing, unexpected)
        #[arg(long)]
        bucket: Option<String>,

        /// Keep only entries whose title contains this text
        #[arg(long)]
        title: Option<String>,

        /// Keep only entries whose item code contains this text
        #[arg(long)]
        code: Option<String>,

        /// Keep only entries whose expected or actual location contains this text
        #[arg(long)]
        location: Option<String>,

        /// Keep only entries whose EPC contains this text
        #[arg(long)]
        epc: Option<String>,

        /// Inclusive lower bound on scan time (e.g. 2026-08-01T09:00:00)
        #[arg(long)]
        from: Option<String>,

        /// Inclusive upper bound on scan time
        #[arg(long)]
        to: Option<String>,

        /// Keep only unexpected entries (tags with no catalog counterpart)
        #[arg(long, conflicts_with = "expected")]
        unexpected: bool,

        /// Keep only catalog-backed entries
        #[arg(long)]
        expected: bool,
    },

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  opname validate stock-take.opname.toml")]
    Validate {
        /// Path to the .opname.toml config file
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            json,
            output,
            bucket,
            title,
            code,
            location,
            epc,
            from,
            to,
            unexpected,
            expected,
        } => {
            let criteria = build_criteria(
                bucket, title, code, location, epc, from, to, unexpected, expected,
            );
            match criteria {
                Ok(criteria) => cmd_run(config, json, output, criteria),
                Err(e) => Err(e),
            }
        }
        Commands::Validate { config } => cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }
}

// -----------------------------------------------------------------------------
// Filter flags
// -----------------------------------------------------------------------------

fn parse_bucket(value: &str) -> Result<OpnameBucket, CliError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "found" => Ok(OpnameBucket::Found),
        "misplaced" => Ok(OpnameBucket::Misplaced),
        "missing" => Ok(OpnameBucket::Missing),
        "unexpected" => Ok(OpnameBucket::Unexpected),
        other => Err(CliError::usage(format!(
            "unknown bucket '{other}' (expected found, misplaced, missing, or unexpected)"
        ))),
    }
}

fn parse_bound(flag: &str, value: &str) -> Result<chrono::NaiveDateTime, CliError> {
    chrono::NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| {
        CliError::usage(format!("--{flag}: cannot parse '{value}' (expected YYYY-MM-DDTHH:MM:SS)"))
    })
}

fn build_criteria(
    bucket: Option<String>,
    title: Option<String>,
    code: Option<String>,
    location: Option<String>,
    epc: Option<String>,
    from: Option<String>,
    to: Option<String>,
    unexpected: bool,
    expected: bool,
) -> Result<FilterCriteria, CliError> {
    let bucket = match bucket {
        Some(ref value) => Some(parse_bucket(value)?),
        None => None,
    };
    let scanned_from = match from {
        Some(ref value) => Some(parse_bound("from", value)?),
        None => None,
    };
    let scanned_to = match to {
        Some(ref value) => Some(parse_bound("to", value)?),
        None => None,
    };

    Ok(FilterCriteria {
        bucket,
        title_contains: title,
        code_contains: code,
        location_contains: location,
        epc_contains: epc,
        scanned_from,
        scanned_to,
        unexpected: match (unexpected, expected) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
    })
}

// -----------------------------------------------------------------------------
// Commands
// -----------------------------------------------------------------------------

fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    criteria: FilterCriteria,
) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::new(EXIT_OPNAME_RUNTIME, format!("cannot read config: {e}")))?;
    let config = OpnameConfig::from_toml(&config_str)
        .map_err(|e| CliError::new(EXIT_OPNAME_INVALID_CONFIG, e.to_string()))?;

    // Resolve input files relative to the config file's directory.
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let catalog_path = base_dir.join(&config.catalog.file);
    let catalog_csv = std::fs::read_to_string(&catalog_path).map_err(|e| {
        CliError::new(EXIT_OPNAME_RUNTIME, format!("cannot read {}: {e}", catalog_path.display()))
    })?;
    let scans_path = base_dir.join(&config.scans.file);
    let scans_csv = std::fs::read_to_string(&scans_path).map_err(|e| {
        CliError::new(EXIT_OPNAME_RUNTIME, format!("cannot read {}: {e}", scans_path.display()))
    })?;

    let catalog = load_catalog_csv(&catalog_csv, &config.catalog)
        .map_err(|e| CliError::new(EXIT_OPNAME_RUNTIME, e.to_string()))?;
    let scans = load_scan_csv(&scans_csv, &config.scans)
        .map_err(|e| CliError::new(EXIT_OPNAME_RUNTIME, e.to_string()))?;

    let mut result = run(&config, catalog, scans)
        .map_err(|e| CliError::new(EXIT_OPNAME_RUNTIME, e.to_string()))?;

    // Filter flags narrow the detail rows; the summary stays whole-count.
    if !criteria.is_empty() {
        result.entries = criteria.apply(&result.entries);
    }

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

    let output_file = output_file.or_else(|| config.output.json.as_ref().map(PathBuf::from));
    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::new(EXIT_OPNAME_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr.
    let s = &result.summary;
    eprintln!(
        "stock take '{}': {} items — {} found, {} misplaced, {} missing, {} unexpected",
        result.meta.config_name, s.total_items, s.found, s.misplaced, s.missing, s.unexpected,
    );

    if s.missing > 0 || s.misplaced > 0 {
        return Err(CliError::new(
            EXIT_OPNAME_DISCREPANCY,
            format!("{} missing, {} misplaced", s.missing, s.misplaced),
        ));
    }
    if s.unexpected > 0 {
        return Err(CliError::new(
            EXIT_OPNAME_UNEXPECTED,
            format!("{} unexpected tag(s)", s.unexpected),
        ));
    }

    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::new(EXIT_OPNAME_RUNTIME, format!("cannot read config: {e}")))?;

    match OpnameConfig::from_toml(&config_str) {
        Ok(config) => {
            eprintln!(
                "valid: stock take '{}' (policy {}, catalog {}, scans {})",
                config.name, config.policy, config.catalog.file, config.scans.file,
            );
            Ok(())
        }
        Err(e) => Err(CliError::new(EXIT_OPNAME_INVALID_CONFIG, e.to_string())),
    }
}
