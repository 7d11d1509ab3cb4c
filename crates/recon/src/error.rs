use std::fmt;

#[derive(Debug)]
pub enum OpnameError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty name, half-mapped spatial columns, etc.).
    ConfigValidation(String),
    /// Missing required column in input data.
    MissingColumn { source: String, column: String },
    /// Scan timestamp does not match the expected format.
    TimestampParse { source: String, record: String, value: String },
    /// Unknown scan method value.
    MethodParse { source: String, record: String, value: String },
    /// Unknown expected-status value.
    StatusParse { source: String, record: String, value: String },
    /// Non-numeric distance/angle cell.
    SpatialParse { source: String, record: String, value: String },
    /// Empty or non-hex EPC.
    InvalidEpc { value: String },
    /// Empty item code / barcode payload.
    InvalidItemCode { value: String },
    /// Two catalog records share the same normalized item code.
    DuplicateItemCode(String),
    /// Two catalog records share the same normalized EPC.
    DuplicateEpc(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for OpnameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { source, column } => {
                write!(f, "{source}: missing column '{column}'")
            }
            Self::TimestampParse { source, record, value } => {
                write!(f, "{source}, record '{record}': cannot parse timestamp '{value}'")
            }
            Self::MethodParse { source, record, value } => {
                write!(f, "{source}, record '{record}': unknown scan method '{value}'")
            }
            Self::StatusParse { source, record, value } => {
                write!(f, "{source}, record '{record}': unknown status '{value}'")
            }
            Self::SpatialParse { source, record, value } => {
                write!(f, "{source}, record '{record}': cannot parse spatial reading '{value}'")
            }
            Self::InvalidEpc { value } => write!(f, "invalid EPC: '{value}'"),
            Self::InvalidItemCode { value } => write!(f, "invalid item code: '{value}'"),
            Self::DuplicateItemCode(code) => write!(f, "duplicate item code in catalog: '{code}'"),
            Self::DuplicateEpc(epc) => write!(f, "duplicate EPC in catalog: '{epc}'"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for OpnameError {}
