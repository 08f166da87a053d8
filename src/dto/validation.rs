//! Validation helpers for request DTOs.

use validator::ValidationError;

/// Longest display name accepted at registration, in characters.
pub const MAX_DISPLAY_NAME_CHARS: usize = 64;

/// Validates that a display name is non-blank and at most [`MAX_DISPLAY_NAME_CHARS`] characters.
///
/// # Examples
///
/// ```ignore
/// validate_display_name("Ana")   // Ok
/// validate_display_name("   ")   // Err - blank
/// ```
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("display_name_blank");
        err.message = Some("Display name must not be blank".into());
        return Err(err);
    }

    let length = name.chars().count();
    if length > MAX_DISPLAY_NAME_CHARS {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some(
            format!(
                "Display name must be at most {MAX_DISPLAY_NAME_CHARS} characters (got {length})"
            )
            .into(),
        );
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new("display_name_format");
        err.message = Some("Display name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}
