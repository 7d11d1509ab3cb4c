use crate::model::OpnameBucket;

/// Classify a catalog-backed entry after the session ends.
///
/// `Misplaced` requires location context on both sides; a scan without
/// location context can never contradict the catalog.
pub fn classify(found: bool, expected_location: Option<&str>, actual_location: Option<&str>) -> OpnameBucket {
    if !found {
        return OpnameBucket::Missing;
    }
    match (expected_location, actual_location) {
        (Some(expected), Some(actual)) if !locations_agree(expected, actual) => {
            OpnameBucket::Misplaced
        }
        _ => OpnameBucket::Found,
    }
}

fn locations_agree(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}
