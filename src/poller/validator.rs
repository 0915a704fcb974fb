use super::error::CycleError;
use crate::model::MatchCategory;

/// Checks that a roster is complete for its category.
///
/// Categories without a fixed size (FFA, customs, unknown modes) always pass.
pub fn validate(category: &MatchCategory, resolved: usize) -> Result<(), CycleError> {
    match category.expected_participants() {
        Some(expected) if expected != resolved => Err(CycleError::IncompleteRoster {
            category: category.kind().to_string(),
            expected,
            actual: resolved,
        }),
        _ => Ok(()),
    }
}
