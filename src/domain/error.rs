use thiserror::Error;

/// Core domain errors
///
/// Every operation surfaces one of these kinds verbatim to the caller.
/// `Storage` is the only kind a caller should retry.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid ID format: {message}")]
    InvalidId { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Locked: {message}")]
    Locked { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Gateway signature did not verify. The message never carries the
    /// expected signature or any partial-match information.
    #[error("Signature verification failed")]
    SignatureMismatch,

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn locked(message: impl Into<String>) -> Self {
        Self::Locked {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Whether a caller may reasonably retry the failed operation as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Team 'falcons' not found");
        assert_eq!(error.to_string(), "Not found: Team 'falcons' not found");
    }

    #[test]
    fn test_conflict_error() {
        let error = DomainError::conflict("Registration already exists");
        assert_eq!(error.to_string(), "Conflict: Registration already exists");
    }

    #[test]
    fn test_locked_error() {
        let error = DomainError::locked("Team 'falcons' is locked");
        assert_eq!(error.to_string(), "Locked: Team 'falcons' is locked");
    }

    #[test]
    fn test_signature_mismatch_message_is_opaque() {
        let error = DomainError::SignatureMismatch;
        assert_eq!(error.to_string(), "Signature verification failed");
    }

    #[test]
    fn test_retryable() {
        assert!(DomainError::storage("connection refused").is_retryable());
        assert!(!DomainError::conflict("duplicate").is_retryable());
        assert!(!DomainError::SignatureMismatch.is_retryable());
    }
}
