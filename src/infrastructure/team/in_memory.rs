//! In-memory team repository

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::profile::ProfileId;
use crate::domain::team::{Team, TeamId, TeamRepository};
use crate::domain::DomainError;

/// Thread-safe in-memory implementation of `TeamRepository`
///
/// Each conditional mutation (join-request append, member move, lock)
/// runs under one write lock: the lock-state check and the set mutation
/// cannot interleave with another request.
#[derive(Debug, Default)]
pub struct InMemoryTeamRepository {
    teams: RwLock<HashMap<String, Team>>,
}

impl InMemoryTeamRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_team<F>(&self, id: &TeamId, f: F) -> Result<Team, DomainError>
    where
        F: FnOnce(&mut Team) -> Result<(), DomainError>,
    {
        let mut teams = self
            .teams
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire team lock: {}", e)))?;

        let team = teams
            .get_mut(id.as_str())
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", id)))?;

        f(team)?;
        Ok(team.clone())
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError> {
        let teams = self
            .teams
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire team lock: {}", e)))?;
        Ok(teams.get(id.as_str()).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Team>, DomainError> {
        let teams = self
            .teams
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire team lock: {}", e)))?;
        Ok(teams.values().find(|t| t.name() == name).cloned())
    }

    async fn find_by_member(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Option<Team>, DomainError> {
        let teams = self
            .teams
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire team lock: {}", e)))?;
        Ok(teams.values().find(|t| t.is_member(profile_id)).cloned())
    }

    async fn create(&self, team: Team) -> Result<Team, DomainError> {
        let mut teams = self
            .teams
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire team lock: {}", e)))?;

        if teams.contains_key(team.id().as_str()) {
            return Err(DomainError::conflict(format!(
                "Team '{}' already exists",
                team.id()
            )));
        }

        if teams.values().any(|t| t.name() == team.name()) {
            return Err(DomainError::conflict(format!(
                "Team name '{}' is already taken",
                team.name()
            )));
        }

        teams.insert(team.id().as_str().to_string(), team.clone());
        Ok(team)
    }

    async fn add_join_request(
        &self,
        id: &TeamId,
        profile_id: &ProfileId,
    ) -> Result<Team, DomainError> {
        self.with_team(id, |team| team.request_join(profile_id.clone()))
    }

    async fn remove_join_request(
        &self,
        id: &TeamId,
        profile_id: &ProfileId,
    ) -> Result<Team, DomainError> {
        self.with_team(id, |team| team.reject_request(profile_id))
    }

    async fn approve_member(
        &self,
        id: &TeamId,
        profile_id: &ProfileId,
    ) -> Result<Team, DomainError> {
        self.with_team(id, |team| team.approve_request(profile_id))
    }

    async fn remove_member(
        &self,
        id: &TeamId,
        profile_id: &ProfileId,
    ) -> Result<Team, DomainError> {
        self.with_team(id, |team| team.remove_member(profile_id))
    }

    async fn lock(&self, id: &TeamId) -> Result<Team, DomainError> {
        self.with_team(id, |team| {
            team.lock();
            Ok(())
        })
    }

    async fn delete(&self, id: &TeamId) -> Result<bool, DomainError> {
        let mut teams = self
            .teams
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire team lock: {}", e)))?;
        Ok(teams.remove(id.as_str()).is_some())
    }
}
