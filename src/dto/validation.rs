//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::engine::models::StudentId;

/// Validates the selected-student list of a begin-session request.
///
/// The list must be non-empty, contain only positive identifiers, and hold
/// no duplicates (the roster is deduplicated anyway, but a duplicated
/// selection is an operator mistake worth rejecting loudly).
pub fn validate_student_ids(ids: &[StudentId]) -> Result<(), ValidationError> {
    if ids.is_empty() {
        let mut err = ValidationError::new("student_ids_empty");
        err.message = Some("At least one student must be selected".into());
        return Err(err);
    }

    if ids.iter().any(|id| *id <= 0) {
        let mut err = ValidationError::new("student_ids_positive");
        err.message = Some("Student identifiers must be positive".into());
        return Err(err);
    }

    let mut seen = std::collections::HashSet::new();
    if !ids.iter().all(|id| seen.insert(*id)) {
        let mut err = ValidationError::new("student_ids_unique");
        err.message = Some("Student identifiers must be unique".into());
        return Err(err);
    }

    Ok(())
}

/// Validates an engine base URL override.
///
/// Only http/https URLs make sense for the engine boundary; a trailing
/// slash is tolerated because the client trims it.
pub fn validate_engine_url(url: &str) -> Result<(), ValidationError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("engine_url_empty");
        err.message = Some("Engine URL must not be empty".into());
        return Err(err);
    }

    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        let mut err = ValidationError::new("engine_url_scheme");
        err.message = Some("Engine URL must start with http:// or https://".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_student_ids_valid() {
        assert!(validate_student_ids(&[1]).is_ok());
        assert!(validate_student_ids(&[3, 1, 2]).is_ok());
    }

    #[test]
    fn test_validate_student_ids_invalid() {
        assert!(validate_student_ids(&[]).is_err()); // empty
        assert!(validate_student_ids(&[1, 0]).is_err()); // non-positive
        assert!(validate_student_ids(&[1, 2, 1]).is_err()); // duplicate
    }

    #[test]
    fn test_validate_engine_url_valid() {
        assert!(validate_engine_url("http://localhost:8000").is_ok());
        assert!(validate_engine_url("https://engine.kinekids.app/").is_ok());
    }

    #[test]
    fn test_validate_engine_url_invalid() {
        assert!(validate_engine_url("").is_err());
        assert!(validate_engine_url("   ").is_err());
        assert!(validate_engine_url("ftp://engine").is_err());
        assert!(validate_engine_url("localhost:8000").is_err());
    }
}
