//! In-memory profile repository

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::profile::{Profile, ProfileId, ProfileRepository};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Thread-safe in-memory implementation of `ProfileRepository`
///
/// Every conditional mutation runs under a single write lock, which is
/// what makes the check-and-set sequences atomic here.
#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned<T>(e: T) -> DomainError
where
    T: std::fmt::Display,
{
    DomainError::storage(format!("Failed to acquire profile lock: {}", e))
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn get(&self, id: &ProfileId) -> Result<Option<Profile>, DomainError> {
        let profiles = self.profiles.read().map_err(lock_poisoned)?;
        Ok(profiles.get(id.as_str()).cloned())
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Profile>, DomainError> {
        let profiles = self.profiles.read().map_err(lock_poisoned)?;
        Ok(profiles
            .values()
            .find(|p| p.external_id() == external_id)
            .cloned())
    }

    async fn create(&self, profile: Profile) -> Result<Profile, DomainError> {
        let mut profiles = self.profiles.write().map_err(lock_poisoned)?;

        if profiles.contains_key(profile.id().as_str()) {
            return Err(DomainError::conflict(format!(
                "Profile '{}' already exists",
                profile.id()
            )));
        }

        if profiles
            .values()
            .any(|p| p.external_id() == profile.external_id())
        {
            return Err(DomainError::conflict(format!(
                "Profile with external identity '{}' already exists",
                profile.external_id()
            )));
        }

        profiles.insert(profile.id().as_str().to_string(), profile.clone());
        Ok(profile)
    }

    async fn update(&self, profile: &Profile) -> Result<Profile, DomainError> {
        let mut profiles = self.profiles.write().map_err(lock_poisoned)?;

        if !profiles.contains_key(profile.id().as_str()) {
            return Err(DomainError::not_found(format!(
                "Profile '{}' not found",
                profile.id()
            )));
        }

        profiles.insert(profile.id().as_str().to_string(), profile.clone());
        Ok(profile.clone())
    }

    async fn set_current_team(
        &self,
        id: &ProfileId,
        team_id: Option<&TeamId>,
    ) -> Result<Profile, DomainError> {
        let mut profiles = self.profiles.write().map_err(lock_poisoned)?;

        let profile = profiles
            .get_mut(id.as_str())
            .ok_or_else(|| DomainError::not_found(format!("Profile '{}' not found", id)))?;

        match team_id {
            Some(team_id) => profile.set_current_team(team_id.clone()),
            None => profile.clear_current_team(),
        }

        Ok(profile.clone())
    }

    async fn add_invitation(
        &self,
        id: &ProfileId,
        team_id: &TeamId,
    ) -> Result<Profile, DomainError> {
        let mut profiles = self.profiles.write().map_err(lock_poisoned)?;

        let profile = profiles
            .get_mut(id.as_str())
            .ok_or_else(|| DomainError::not_found(format!("Profile '{}' not found", id)))?;

        profile.add_invitation(team_id.clone());
        Ok(profile.clone())
    }

    async fn remove_invitation(
        &self,
        id: &ProfileId,
        team_id: &TeamId,
    ) -> Result<bool, DomainError> {
        let mut profiles = self.profiles.write().map_err(lock_poisoned)?;

        let profile = profiles
            .get_mut(id.as_str())
            .ok_or_else(|| DomainError::not_found(format!("Profile '{}' not found", id)))?;

        Ok(profile.remove_invitation(team_id))
    }

    async fn detach_team(&self, team_id: &TeamId) -> Result<u64, DomainError> {
        let mut profiles = self.profiles.write().map_err(lock_poisoned)?;
        let mut touched = 0u64;

        for profile in profiles.values_mut() {
            let mut changed = false;

            if profile.current_team_id() == Some(team_id) {
                profile.clear_current_team();
                changed = true;
            }

            if profile.remove_invitation(team_id) {
                changed = true;
            }

            if changed {
                touched += 1;
            }
        }

        Ok(touched)
    }

    async fn list(&self) -> Result<Vec<Profile>, DomainError> {
        let profiles = self.profiles.read().map_err(lock_poisoned)?;
        let mut result: Vec<Profile> = profiles.values().cloned().collect();
        result.sort_by(|a, b| a.created_at().cmp(&b.created_at()));
        Ok(result)
    }
}
