//! Profile validation

use thiserror::Error;

/// Errors that can occur during profile validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileValidationError {
    #[error("Profile ID cannot be empty")]
    EmptyId,

    #[error("Profile ID cannot exceed {0} characters")]
    IdTooLong(usize),

    #[error("Profile ID can only contain alphanumeric characters and hyphens")]
    InvalidIdCharacters,

    #[error("External identity cannot be empty")]
    EmptyExternalId,

    #[error("External identity cannot exceed {0} characters")]
    ExternalIdTooLong(usize),

    #[error("Display name cannot be empty")]
    EmptyName,

    #[error("Display name cannot exceed {0} characters")]
    NameTooLong(usize),

    #[error("Email address is not well-formed")]
    InvalidEmail,
}

const MAX_PROFILE_ID_LENGTH: usize = 50;
const MAX_EXTERNAL_ID_LENGTH: usize = 255;
const MAX_NAME_LENGTH: usize = 100;

/// Validate a profile ID
pub fn validate_profile_id(id: &str) -> Result<(), ProfileValidationError> {
    if id.is_empty() {
        return Err(ProfileValidationError::EmptyId);
    }

    if id.len() > MAX_PROFILE_ID_LENGTH {
        return Err(ProfileValidationError::IdTooLong(MAX_PROFILE_ID_LENGTH));
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ProfileValidationError::InvalidIdCharacters);
    }

    Ok(())
}

/// Validate an external identity key
pub fn validate_external_id(external_id: &str) -> Result<(), ProfileValidationError> {
    if external_id.is_empty() {
        return Err(ProfileValidationError::EmptyExternalId);
    }

    if external_id.len() > MAX_EXTERNAL_ID_LENGTH {
        return Err(ProfileValidationError::ExternalIdTooLong(
            MAX_EXTERNAL_ID_LENGTH,
        ));
    }

    Ok(())
}

/// Validate a display name
pub fn validate_display_name(name: &str) -> Result<(), ProfileValidationError> {
    if name.trim().is_empty() {
        return Err(ProfileValidationError::EmptyName);
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(ProfileValidationError::NameTooLong(MAX_NAME_LENGTH));
    }

    Ok(())
}

/// Validate an email address (structural check only)
pub fn validate_email(email: &str) -> Result<(), ProfileValidationError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ProfileValidationError::InvalidEmail);
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ProfileValidationError::InvalidEmail);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_profile_id() {
        assert!(validate_profile_id("participant-1").is_ok());
        assert!(validate_profile_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
    }

    #[test]
    fn test_invalid_profile_id() {
        assert_eq!(validate_profile_id(""), Err(ProfileValidationError::EmptyId));
        assert_eq!(
            validate_profile_id(&"a".repeat(51)),
            Err(ProfileValidationError::IdTooLong(50))
        );
        assert_eq!(
            validate_profile_id("user_1"),
            Err(ProfileValidationError::InvalidIdCharacters)
        );
    }

    #[test]
    fn test_external_id() {
        assert!(validate_external_id("auth0|abc123").is_ok());
        assert_eq!(
            validate_external_id(""),
            Err(ProfileValidationError::EmptyExternalId)
        );
    }

    #[test]
    fn test_display_name() {
        assert!(validate_display_name("Asha Rao").is_ok());
        assert_eq!(
            validate_display_name("   "),
            Err(ProfileValidationError::EmptyName)
        );
    }

    #[test]
    fn test_email() {
        assert!(validate_email("asha@example.com").is_ok());
        assert_eq!(validate_email("asha"), Err(ProfileValidationError::InvalidEmail));
        assert_eq!(
            validate_email("asha@localhost"),
            Err(ProfileValidationError::InvalidEmail)
        );
    }
}
