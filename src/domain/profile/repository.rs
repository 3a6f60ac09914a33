//! Profile repository trait

use async_trait::async_trait;

use super::entity::{Profile, ProfileId};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Repository for managing profiles
///
/// Set mutations (`add_invitation`, `remove_invitation`) and the disband
/// cascade (`detach_team`) must be atomic at the store level: a single
/// guarded write, never a read-modify-write in application memory.
#[async_trait]
pub trait ProfileRepository: Send + Sync + std::fmt::Debug {
    /// Get a profile by ID
    async fn get(&self, id: &ProfileId) -> Result<Option<Profile>, DomainError>;

    /// Look up a profile by its external identity key
    async fn find_by_external_id(&self, external_id: &str)
        -> Result<Option<Profile>, DomainError>;

    /// Create a new profile; conflicts on duplicate id or external id
    async fn create(&self, profile: Profile) -> Result<Profile, DomainError>;

    /// Update an existing profile
    async fn update(&self, profile: &Profile) -> Result<Profile, DomainError>;

    /// Atomically record the team a profile belongs to (`None` detaches)
    async fn set_current_team(
        &self,
        id: &ProfileId,
        team_id: Option<&TeamId>,
    ) -> Result<Profile, DomainError>;

    /// Atomic set-add of a pending invitation; idempotent
    async fn add_invitation(
        &self,
        id: &ProfileId,
        team_id: &TeamId,
    ) -> Result<Profile, DomainError>;

    /// Atomic set-remove of a pending invitation; false if it was absent
    async fn remove_invitation(
        &self,
        id: &ProfileId,
        team_id: &TeamId,
    ) -> Result<bool, DomainError>;

    /// Clear `current_team_id` and strip pending invitations for every
    /// profile referencing the given team. Returns the number of profiles
    /// touched. Used for the disband cascade.
    async fn detach_team(&self, team_id: &TeamId) -> Result<u64, DomainError>;

    /// List every profile (admin export)
    async fn list(&self) -> Result<Vec<Profile>, DomainError>;
}
