//! Team entity and related types

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{validate_team_id, validate_team_name, TeamValidationError};
use crate::domain::profile::ProfileId;
use crate::domain::DomainError;

/// Team identifier - alphanumeric + hyphens, max 50 characters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamId(String);

impl TeamId {
    /// Create a new TeamId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, TeamValidationError> {
        let id = id.into();
        validate_team_id(&id)?;
        Ok(Self(id))
    }

    /// Mint a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TeamId {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamId> for String {
    fn from(id: TeamId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team entity
///
/// Invariants upheld here and re-checked by repositories inside their
/// atomic sections: the leader is always a member, a locked team refuses
/// membership mutation, and the lock transition is idempotent and
/// irreversible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Unique identifier
    id: TeamId,
    /// Unique display name
    name: String,
    /// The profile that owns the team
    leader_id: ProfileId,
    /// All members, leader included
    members: BTreeSet<ProfileId>,
    /// Profiles awaiting leader approval
    #[serde(default)]
    join_requests: BTreeSet<ProfileId>,
    /// Roster freeze flag, set when payment begins
    is_locked: bool,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Last update timestamp
    updated_at: DateTime<Utc>,
}

impl Team {
    /// Create a new team with the leader as sole member
    pub fn new(
        id: TeamId,
        name: impl Into<String>,
        leader_id: ProfileId,
    ) -> Result<Self, TeamValidationError> {
        let name = name.into();
        validate_team_name(&name)?;
        let now = Utc::now();

        Ok(Self {
            id,
            name,
            members: BTreeSet::from([leader_id.clone()]),
            leader_id,
            join_requests: BTreeSet::new(),
            is_locked: false,
            created_at: now,
            updated_at: now,
        })
    }

    // Getters

    pub fn id(&self) -> &TeamId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn leader_id(&self) -> &ProfileId {
        &self.leader_id
    }

    pub fn members(&self) -> &BTreeSet<ProfileId> {
        &self.members
    }

    pub fn join_requests(&self) -> &BTreeSet<ProfileId> {
        &self.join_requests
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the profile leads this team
    pub fn is_leader(&self, profile_id: &ProfileId) -> bool {
        &self.leader_id == profile_id
    }

    /// Whether the profile is a member (the leader always is)
    pub fn is_member(&self, profile_id: &ProfileId) -> bool {
        self.members.contains(profile_id)
    }

    // Mutators

    /// Append a join request
    pub fn request_join(&mut self, profile_id: ProfileId) -> Result<(), DomainError> {
        self.ensure_unlocked()?;

        if self.members.contains(&profile_id) {
            return Err(DomainError::conflict(format!(
                "Profile '{}' is already a member of team '{}'",
                profile_id, self.id
            )));
        }

        if !self.join_requests.insert(profile_id.clone()) {
            return Err(DomainError::conflict(format!(
                "Profile '{}' already requested to join team '{}'",
                profile_id, self.id
            )));
        }

        self.touch();
        Ok(())
    }

    /// Move a pending requester into the member set
    pub fn approve_request(&mut self, profile_id: &ProfileId) -> Result<(), DomainError> {
        self.ensure_unlocked()?;

        if !self.join_requests.remove(profile_id) {
            return Err(DomainError::not_found(format!(
                "No pending join request from profile '{}' on team '{}'",
                profile_id, self.id
            )));
        }

        self.members.insert(profile_id.clone());
        self.touch();
        Ok(())
    }

    /// Drop a pending join request without admitting the requester
    ///
    /// Allowed on a locked team: clearing a stale request does not change
    /// the membership roster.
    pub fn reject_request(&mut self, profile_id: &ProfileId) -> Result<(), DomainError> {
        if !self.join_requests.remove(profile_id) {
            return Err(DomainError::not_found(format!(
                "No pending join request from profile '{}' on team '{}'",
                profile_id, self.id
            )));
        }

        self.touch();
        Ok(())
    }

    /// Remove a regular member; the leader can only leave by disbanding
    pub fn remove_member(&mut self, profile_id: &ProfileId) -> Result<(), DomainError> {
        self.ensure_unlocked()?;

        if self.is_leader(profile_id) {
            return Err(DomainError::validation(format!(
                "Leader '{}' cannot be removed from team '{}'; the team must be disbanded",
                profile_id, self.id
            )));
        }

        if !self.members.remove(profile_id) {
            return Err(DomainError::not_found(format!(
                "Profile '{}' is not a member of team '{}'",
                profile_id, self.id
            )));
        }

        self.touch();
        Ok(())
    }

    /// Freeze the roster. Idempotent; there is no unlock.
    ///
    /// Returns true if this call performed the transition.
    pub fn lock(&mut self) -> bool {
        if self.is_locked {
            return false;
        }

        self.is_locked = true;
        self.touch();
        true
    }

    fn ensure_unlocked(&self) -> Result<(), DomainError> {
        if self.is_locked {
            return Err(DomainError::locked(format!(
                "Team '{}' is locked; membership can no longer change",
                self.id
            )));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> (Team, ProfileId) {
        let leader = ProfileId::generate();
        let team = Team::new(TeamId::generate(), "Falcons", leader.clone()).unwrap();
        (team, leader)
    }

    #[test]
    fn test_leader_is_initial_member() {
        let (team, leader) = team();
        assert!(team.is_leader(&leader));
        assert!(team.is_member(&leader));
        assert_eq!(team.members().len(), 1);
        assert!(!team.is_locked());
    }

    #[test]
    fn test_join_request_lifecycle() {
        let (mut team, _) = team();
        let requester = ProfileId::generate();

        team.request_join(requester.clone()).unwrap();
        assert!(team.join_requests().contains(&requester));

        team.approve_request(&requester).unwrap();
        assert!(team.is_member(&requester));
        assert!(team.join_requests().is_empty());
    }

    #[test]
    fn test_duplicate_join_request_conflicts() {
        let (mut team, _) = team();
        let requester = ProfileId::generate();

        team.request_join(requester.clone()).unwrap();
        let result = team.request_join(requester);
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[test]
    fn test_member_cannot_request_join() {
        let (mut team, leader) = team();
        let result = team.request_join(leader);
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[test]
    fn test_reject_request() {
        let (mut team, _) = team();
        let requester = ProfileId::generate();

        team.request_join(requester.clone()).unwrap();
        team.reject_request(&requester).unwrap();
        assert!(team.join_requests().is_empty());
        assert!(!team.is_member(&requester));

        let result = team.reject_request(&requester);
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[test]
    fn test_locked_team_refuses_membership_mutation() {
        let (mut team, _) = team();
        let requester = ProfileId::generate();
        team.request_join(requester.clone()).unwrap();
        team.approve_request(&requester).unwrap();

        assert!(team.lock());

        let joiner = ProfileId::generate();
        assert!(matches!(
            team.request_join(joiner),
            Err(DomainError::Locked { .. })
        ));
        assert!(matches!(
            team.remove_member(&requester),
            Err(DomainError::Locked { .. })
        ));
    }

    #[test]
    fn test_lock_is_idempotent() {
        let (mut team, _) = team();
        assert!(team.lock());
        assert!(!team.lock());
        assert!(team.is_locked());
    }

    #[test]
    fn test_leader_cannot_be_removed() {
        let (mut team, leader) = team();
        let result = team.remove_member(&leader);
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[test]
    fn test_remove_member() {
        let (mut team, _) = team();
        let member = ProfileId::generate();
        team.request_join(member.clone()).unwrap();
        team.approve_request(&member).unwrap();

        team.remove_member(&member).unwrap();
        assert!(!team.is_member(&member));
    }
}
