//! Identifier normalization. Every index key and every lookup goes through
//! these, so matching is case-insensitive and whitespace-tolerant.

use crate::error::OpnameError;

/// Normalize an EPC: trim, require non-empty ASCII hex, uppercase.
pub fn normalize_epc(raw: &str) -> Result<String, OpnameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(OpnameError::InvalidEpc { value: raw.to_string() });
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Normalize an item code / barcode payload: trim, require non-empty,
/// uppercase. Item codes are business keys, compared case-insensitively.
pub fn normalize_item_code(raw: &str) -> Result<String, OpnameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(OpnameError::InvalidItemCode { value: raw.to_string() });
    }
    Ok(trimmed.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epc_is_trimmed_and_uppercased() {
        assert_eq!(normalize_epc("  e200001a  ").unwrap(), "E200001A");
    }

    #[test]
    fn epc_rejects_empty() {
        assert!(normalize_epc("").is_err());
        assert!(normalize_epc("   ").is_err());
    }

    #[test]
    fn epc_rejects_non_hex() {
        assert!(normalize_epc("E2-00-01").is_err());
        assert!(normalize_epc("GHIJ").is_err());
    }

    #[test]
    fn item_code_is_trimmed_and_uppercased() {
        assert_eq!(normalize_item_code(" b001 ").unwrap(), "B001");
    }

    #[test]
    fn item_code_allows_non_hex() {
        assert_eq!(normalize_item_code("BK-2024/17").unwrap(), "BK-2024/17");
    }

    #[test]
    fn item_code_rejects_empty() {
        assert!(normalize_item_code("  ").is_err());
    }
}
