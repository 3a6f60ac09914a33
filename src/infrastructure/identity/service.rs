//! Identity resolution service
//!
//! Maps an external authenticated identity to an internal profile. Owns
//! no business rules beyond profile creation on first visit.

use std::sync::Arc;

use tracing::info;

use crate::domain::profile::{require_admin, Profile, ProfileId, ProfileRepository};
use crate::domain::DomainError;

/// Resolves external identities to profiles, creating them on first visit
#[derive(Debug, Clone)]
pub struct IdentityService {
    profiles: Arc<dyn ProfileRepository>,
}

impl IdentityService {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    /// Look up the profile behind an external identity key
    pub async fn resolve(&self, external_id: &str) -> Result<Option<Profile>, DomainError> {
        self.profiles.find_by_external_id(external_id).await
    }

    /// Resolve an external identity, creating the profile on first visit
    pub async fn resolve_or_register(
        &self,
        external_id: &str,
        name: &str,
        email: &str,
    ) -> Result<Profile, DomainError> {
        if let Some(profile) = self.profiles.find_by_external_id(external_id).await? {
            return Ok(profile);
        }

        let profile = Profile::new(ProfileId::generate(), external_id, name, email)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        info!(id = %profile.id(), external_id = %external_id, "Registering new profile");

        match self.profiles.create(profile).await {
            Ok(profile) => Ok(profile),
            // A concurrent first visit can win the insert; fall back to
            // the row it created.
            Err(DomainError::Conflict { .. }) => self
                .profiles
                .find_by_external_id(external_id)
                .await?
                .ok_or_else(|| {
                    DomainError::internal(format!(
                        "Profile for '{}' vanished after conflicting insert",
                        external_id
                    ))
                }),
            Err(e) => Err(e),
        }
    }

    /// Full user export; admin only
    pub async fn export_profiles(&self, caller: &Profile) -> Result<Vec<Profile>, DomainError> {
        require_admin(caller)?;
        self.profiles.list().await
    }
}
