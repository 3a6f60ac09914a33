//! Team repository trait

use async_trait::async_trait;

use super::entity::{Team, TeamId};
use crate::domain::profile::ProfileId;
use crate::domain::DomainError;

/// Repository for managing teams
///
/// Every conditional mutation below (join-request set operations, member
/// moves, the lock transition) is a single atomic store operation: the
/// lock-state check and the set mutation land in the same guarded write,
/// so concurrent requests can never interleave between check and update.
#[async_trait]
pub trait TeamRepository: Send + Sync + std::fmt::Debug {
    /// Get a team by ID
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError>;

    /// Look up a team by its unique name
    async fn find_by_name(&self, name: &str) -> Result<Option<Team>, DomainError>;

    /// Find the team a profile leads or belongs to, if any
    async fn find_by_member(&self, profile_id: &ProfileId)
        -> Result<Option<Team>, DomainError>;

    /// Create a new team; conflicts on duplicate id or name
    async fn create(&self, team: Team) -> Result<Team, DomainError>;

    /// Atomically append a join request.
    /// Fails `Locked` on a locked team, `Conflict` on a duplicate request
    /// or an existing member, `NotFound` on a missing team.
    async fn add_join_request(
        &self,
        id: &TeamId,
        profile_id: &ProfileId,
    ) -> Result<Team, DomainError>;

    /// Atomically drop a pending join request without admitting it
    async fn remove_join_request(
        &self,
        id: &TeamId,
        profile_id: &ProfileId,
    ) -> Result<Team, DomainError>;

    /// Atomically move a pending requester into the member set.
    /// Fails `Locked` on a locked team.
    async fn approve_member(
        &self,
        id: &TeamId,
        profile_id: &ProfileId,
    ) -> Result<Team, DomainError>;

    /// Atomically remove a regular member. Fails `Locked` on a locked team.
    async fn remove_member(
        &self,
        id: &TeamId,
        profile_id: &ProfileId,
    ) -> Result<Team, DomainError>;

    /// Idempotent transition to the locked state
    async fn lock(&self, id: &TeamId) -> Result<Team, DomainError>;

    /// Delete a team (disband); returns true if it existed
    async fn delete(&self, id: &TeamId) -> Result<bool, DomainError>;
}
