//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_NAME_LENGTH: usize = 64;

/// Validates that a display name is non-blank and at most 64 characters.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("name_length");
        err.message =
            Some(format!("name must be at most {MAX_NAME_LENGTH} characters").into());
        return Err(err);
    }

    Ok(())
}

/// Validates that the round robin leg count is 1 (single) or 2 (double).
pub fn validate_robin_legs(legs: u8) -> Result<(), ValidationError> {
    if !(1..=2).contains(&legs) {
        let mut err = ValidationError::new("robin_legs");
        err.message = Some("round robin legs must be 1 or 2".into());
        return Err(err);
    }
    Ok(())
}
