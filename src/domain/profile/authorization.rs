//! Admin capability check
//!
//! Single predicate consumed by every privileged operation. Callers must
//! distinguish `Forbidden` (identity resolved, capability missing) from
//! `Unauthorized` (identity resolution itself failed); this module only
//! ever produces the former.

use super::entity::Profile;
use crate::domain::DomainError;

/// Typed decision of the admin gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Check whether a resolved profile holds administrative capability
pub fn check_admin(profile: &Profile) -> AccessDecision {
    if profile.role().is_admin() {
        AccessDecision::Allowed
    } else {
        AccessDecision::Denied
    }
}

/// Convenience guard returning `Forbidden` when the gate denies
pub fn require_admin(profile: &Profile) -> Result<(), DomainError> {
    match check_admin(profile) {
        AccessDecision::Allowed => Ok(()),
        AccessDecision::Denied => Err(DomainError::forbidden(format!(
            "Profile '{}' lacks administrative capability",
            profile.id()
        ))),
    }
}
