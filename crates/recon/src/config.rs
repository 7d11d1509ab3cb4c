use serde::{Deserialize, Serialize};

use crate::error::OpnameError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OpnameConfig {
    pub name: String,
    #[serde(default)]
    pub policy: RescanPolicy,
    pub catalog: CatalogSource,
    pub scans: ScanSource,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Rescan policy
// ---------------------------------------------------------------------------

/// What a second scan of an already-found item does to the recorded
/// observation. `FirstWins` keeps the original timestamp/location (the
/// audit-relevant first sighting); `LastWins` overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescanPolicy {
    FirstWins,
    LastWins,
}

impl Default for RescanPolicy {
    fn default() -> Self {
        Self::FirstWins
    }
}

impl std::fmt::Display for RescanPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstWins => write!(f, "first_wins"),
            Self::LastWins => write!(f, "last_wins"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources + column mappings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSource {
    pub file: String,
    pub columns: CatalogColumns,
}

/// Header names in the catalog CSV. Optional mappings, when omitted, leave
/// the corresponding field absent on every record.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogColumns {
    pub item_code: String,
    #[serde(default)]
    pub epc: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanSource {
    pub file: String,
    pub columns: ScanColumns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanColumns {
    pub identifier: String,
    pub method: String,
    pub timestamp: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub distance: Option<String>,
    #[serde(default)]
    pub angle: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl OpnameConfig {
    pub fn from_toml(input: &str) -> Result<Self, OpnameError> {
        let config: OpnameConfig =
            toml::from_str(input).map_err(|e| OpnameError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OpnameError> {
        if self.name.trim().is_empty() {
            return Err(OpnameError::ConfigValidation("name must not be empty".into()));
        }
        if self.catalog.file.trim().is_empty() {
            return Err(OpnameError::ConfigValidation("catalog.file must not be empty".into()));
        }
        if self.scans.file.trim().is_empty() {
            return Err(OpnameError::ConfigValidation("scans.file must not be empty".into()));
        }

        let required = [
            ("catalog.columns.item_code", &self.catalog.columns.item_code),
            ("scans.columns.identifier", &self.scans.columns.identifier),
            ("scans.columns.method", &self.scans.columns.method),
            ("scans.columns.timestamp", &self.scans.columns.timestamp),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(OpnameError::ConfigValidation(format!("{key} must not be empty")));
            }
        }

        // Spatial readings need both axes to be meaningful.
        if self.scans.columns.distance.is_some() != self.scans.columns.angle.is_some() {
            return Err(OpnameError::ConfigValidation(
                "scans.columns.distance and scans.columns.angle must be mapped together".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Main library stock take"

[catalog]
file = "catalog.csv"
[catalog.columns]
item_code = "item_code"
epc       = "epc"
title     = "title"
location  = "shelf"
status    = "status"

[scans]
file = "scans.csv"
[scans.columns]
identifier = "identifier"
method     = "method"
timestamp  = "scanned_at"
location   = "location"
"#;

    #[test]
    fn parse_valid() {
        let config = OpnameConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Main library stock take");
        assert_eq!(config.policy, RescanPolicy::FirstWins);
        assert_eq!(config.catalog.file, "catalog.csv");
        assert_eq!(config.scans.columns.timestamp, "scanned_at");
        assert!(config.scans.columns.distance.is_none());
        assert!(config.output.json.is_none());
    }

    #[test]
    fn parse_policy_last_wins() {
        // Top-level key, so it has to precede the table headers.
        let input = format!("policy = \"last_wins\"\n{VALID}");
        let config = OpnameConfig::from_toml(&input).unwrap();
        assert_eq!(config.policy, RescanPolicy::LastWins);
    }

    #[test]
    fn parse_rejects_unknown_policy() {
        let input = format!("policy = \"first_win\"\n{VALID}");
        assert!(OpnameConfig::from_toml(&input).is_err(), "typo in policy should fail");
    }

    #[test]
    fn parse_output_file() {
        let input = format!("{VALID}\n[output]\njson = \"report.json\"\n");
        let config = OpnameConfig::from_toml(&input).unwrap();
        assert_eq!(config.output.json.as_deref(), Some("report.json"));
    }

    #[test]
    fn reject_empty_name() {
        let input = VALID.replace("Main library stock take", "  ");
        let err = OpnameConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn reject_half_mapped_spatial_columns() {
        let input = VALID.replace(
            "location   = \"location\"",
            "location   = \"location\"\ndistance   = \"distance_m\"",
        );
        let err = OpnameConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("distance"));
    }

    #[test]
    fn spatial_columns_accepted_together() {
        let input = VALID.replace(
            "location   = \"location\"",
            "location   = \"location\"\ndistance   = \"distance_m\"\nangle      = \"angle_deg\"",
        );
        let config = OpnameConfig::from_toml(&input).unwrap();
        assert_eq!(config.scans.columns.distance.as_deref(), Some("distance_m"));
        assert_eq!(config.scans.columns.angle.as_deref(), Some("angle_deg"));
    }
}
