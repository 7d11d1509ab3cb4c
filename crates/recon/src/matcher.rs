use std::collections::HashMap;

use crate::error::OpnameError;

/// Hash index over the session's entry table, keyed by normalized
/// identifiers. Lookup is O(1) amortized.
///
/// The EPC index is consulted first; the item-code index is the fallback,
/// which covers barcode-derived identifiers (and tag ids printed as
/// barcodes). Keys must already be normalized (see [`crate::ident`]).
#[derive(Debug)]
pub struct CatalogIndex {
    by_epc: HashMap<String, usize>,
    by_code: HashMap<String, usize>,
}

impl CatalogIndex {
    /// Build the index from `(item_code, epc)` key pairs, one per entry,
    /// in entry-table order. Duplicate keys are rejected: an ambiguous
    /// index cannot classify reliably.
    pub fn build<'a, I>(keys: I) -> Result<Self, OpnameError>
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let mut by_epc = HashMap::new();
        let mut by_code = HashMap::new();

        for (i, (code, epc)) in keys.into_iter().enumerate() {
            if by_code.insert(code.to_string(), i).is_some() {
                return Err(OpnameError::DuplicateItemCode(code.to_string()));
            }
            if let Some(epc) = epc {
                if by_epc.insert(epc.to_string(), i).is_some() {
                    return Err(OpnameError::DuplicateEpc(epc.to_string()));
                }
            }
        }

        Ok(Self { by_epc, by_code })
    }

    /// Find the entry matching a normalized identifier: EPC first, item
    /// code as fallback. `None` signals an unexpected scan, not an error.
    pub fn lookup(&self, identifier: &str) -> Option<usize> {
        self.by_epc
            .get(identifier)
            .or_else(|| self.by_code.get(identifier))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_epc_and_code() {
        let index = CatalogIndex::build([
            ("B001", Some("E200001A")),
            ("B002", None),
        ])
        .unwrap();
        assert_eq!(index.lookup("E200001A"), Some(0));
        assert_eq!(index.lookup("B001"), Some(0));
        assert_eq!(index.lookup("B002"), Some(1));
        assert_eq!(index.lookup("FFDEAD"), None);
    }

    #[test]
    fn epc_index_takes_priority() {
        // A catalog where one item's code collides with another's EPC.
        let index = CatalogIndex::build([
            ("B001", Some("CAFE01")),
            ("CAFE01", None),
        ])
        .unwrap();
        assert_eq!(index.lookup("CAFE01"), Some(0));
    }

    #[test]
    fn duplicate_item_code_rejected() {
        let err = CatalogIndex::build([("B001", None), ("B001", None)]).unwrap_err();
        assert!(matches!(err, OpnameError::DuplicateItemCode(code) if code == "B001"));
    }

    #[test]
    fn duplicate_epc_rejected() {
        let err = CatalogIndex::build([
            ("B001", Some("E200001A")),
            ("B002", Some("E200001A")),
        ])
        .unwrap_err();
        assert!(matches!(err, OpnameError::DuplicateEpc(epc) if epc == "E200001A"));
    }
}
