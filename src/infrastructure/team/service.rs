//! Team registry service
//!
//! Owns team creation, membership, join requests, invitations and the
//! lock state. Membership mutations are delegated to the repository's
//! atomic operations; this service adds the cross-aggregate steps
//! (profile `current_team_id`, invitation sets) around them.

use std::sync::Arc;

use tracing::info;

use crate::domain::profile::{Profile, ProfileId, ProfileRepository};
use crate::domain::team::{Team, TeamId, TeamRepository};
use crate::domain::DomainError;

/// Team registry service
#[derive(Debug, Clone)]
pub struct TeamService {
    teams: Arc<dyn TeamRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl TeamService {
    pub fn new(teams: Arc<dyn TeamRepository>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { teams, profiles }
    }

    async fn fetch(&self, id: &TeamId) -> Result<Team, DomainError> {
        self.teams
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", id)))
    }

    /// The team a profile currently leads or belongs to, if any
    pub async fn team_of(&self, profile: &Profile) -> Result<Option<Team>, DomainError> {
        if let Some(team_id) = profile.current_team_id() {
            if let Some(team) = self.teams.get(team_id).await? {
                return Ok(Some(team));
            }
        }

        self.teams.find_by_member(profile.id()).await
    }

    async fn ensure_unaffiliated(&self, profile: &Profile) -> Result<(), DomainError> {
        if self.team_of(profile).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "Profile '{}' already belongs to a team",
                profile.id()
            )));
        }

        Ok(())
    }

    async fn fetch_led_by(
        &self,
        team_id: &TeamId,
        caller: &Profile,
    ) -> Result<Team, DomainError> {
        let team = self.fetch(team_id).await?;

        if !team.is_leader(caller.id()) {
            return Err(DomainError::forbidden(format!(
                "Profile '{}' is not the leader of team '{}'",
                caller.id(),
                team_id
            )));
        }

        Ok(team)
    }

    /// Create a team with the caller as leader and sole member
    pub async fn create_team(&self, leader: &Profile, name: &str) -> Result<Team, DomainError> {
        info!(leader = %leader.id(), name = %name, "Creating team");

        self.ensure_unaffiliated(leader).await?;

        if self.teams.find_by_name(name).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "Team name '{}' is already taken",
                name
            )));
        }

        let team = Team::new(TeamId::generate(), name, leader.id().clone())
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let team = self.teams.create(team).await?;
        self.profiles
            .set_current_team(leader.id(), Some(team.id()))
            .await?;

        Ok(team)
    }

    /// File a join request against a team
    pub async fn request_join(
        &self,
        requester: &Profile,
        team_id: &TeamId,
    ) -> Result<Team, DomainError> {
        info!(requester = %requester.id(), team = %team_id, "Join request");

        self.ensure_unaffiliated(requester).await?;
        self.teams.add_join_request(team_id, requester.id()).await
    }

    /// Approve a pending join request; leader only
    pub async fn approve_join(
        &self,
        caller: &Profile,
        team_id: &TeamId,
        requester_id: &ProfileId,
    ) -> Result<Team, DomainError> {
        info!(team = %team_id, requester = %requester_id, "Approving join request");

        self.fetch_led_by(team_id, caller).await?;

        let requester = self.profiles.get(requester_id).await?.ok_or_else(|| {
            DomainError::not_found(format!("Profile '{}' not found", requester_id))
        })?;

        // The requester may have joined elsewhere since asking; the
        // request is stale and cannot be honored.
        if let Err(e) = self.ensure_unaffiliated(&requester).await {
            self.teams.remove_join_request(team_id, requester_id).await?;
            return Err(e);
        }

        let team = self.teams.approve_member(team_id, requester_id).await?;
        self.profiles
            .set_current_team(requester_id, Some(team_id))
            .await?;
        // A pending invitation to the same team is now moot
        self.profiles
            .remove_invitation(requester_id, team_id)
            .await?;

        Ok(team)
    }

    /// Clear a pending join request; leader only. Allowed on locked teams
    /// since no membership changes.
    pub async fn reject_join(
        &self,
        caller: &Profile,
        team_id: &TeamId,
        requester_id: &ProfileId,
    ) -> Result<Team, DomainError> {
        info!(team = %team_id, requester = %requester_id, "Rejecting join request");

        self.fetch_led_by(team_id, caller).await?;
        self.teams.remove_join_request(team_id, requester_id).await
    }

    /// Invite a profile to the caller's team; leader only, idempotent
    pub async fn invite(
        &self,
        caller: &Profile,
        team_id: &TeamId,
        invitee_id: &ProfileId,
    ) -> Result<Profile, DomainError> {
        info!(team = %team_id, invitee = %invitee_id, "Inviting profile");

        let team = self.fetch_led_by(team_id, caller).await?;
        if team.is_locked() {
            return Err(DomainError::locked(format!(
                "Team '{}' is locked; membership can no longer change",
                team_id
            )));
        }

        self.profiles.add_invitation(invitee_id, team_id).await
    }

    /// Withdraw a pending invitation; leader only
    pub async fn cancel_invite(
        &self,
        caller: &Profile,
        team_id: &TeamId,
        invitee_id: &ProfileId,
    ) -> Result<(), DomainError> {
        info!(team = %team_id, invitee = %invitee_id, "Cancelling invitation");

        self.fetch_led_by(team_id, caller).await?;

        let removed = self.profiles.remove_invitation(invitee_id, team_id).await?;
        if !removed {
            return Err(DomainError::not_found(format!(
                "Profile '{}' has no pending invitation to team '{}'",
                invitee_id, team_id
            )));
        }

        Ok(())
    }

    /// Leave the caller's team; a leader leaving disbands the whole team
    pub async fn leave_or_disband(&self, caller: &Profile) -> Result<(), DomainError> {
        let team = self.team_of(caller).await?.ok_or_else(|| {
            DomainError::not_found(format!(
                "Profile '{}' does not belong to any team",
                caller.id()
            ))
        })?;

        if team.is_leader(caller.id()) {
            if team.is_locked() {
                return Err(DomainError::locked(format!(
                    "Team '{}' is locked; membership can no longer change",
                    team.id()
                )));
            }

            info!(team = %team.id(), leader = %caller.id(), "Disbanding team");

            // Detach every member and strip invitations before the team
            // row disappears; a crash in between leaves only orphaned
            // profiles pointing at nothing, never a half-disbanded team.
            self.profiles.detach_team(team.id()).await?;
            self.teams.delete(team.id()).await?;
        } else {
            info!(team = %team.id(), member = %caller.id(), "Member leaving team");

            self.teams.remove_member(team.id(), caller.id()).await?;
            self.profiles.set_current_team(caller.id(), None).await?;
        }

        Ok(())
    }

    /// Get a team by ID
    pub async fn get(&self, id: &TeamId) -> Result<Team, DomainError> {
        self.fetch(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::ProfileId;
    use crate::infrastructure::profile::InMemoryProfileRepository;
    use crate::infrastructure::team::InMemoryTeamRepository;

    struct Fixture {
        service: TeamService,
        profiles: Arc<InMemoryProfileRepository>,
        teams: Arc<InMemoryTeamRepository>,
    }

    fn fixture() -> Fixture {
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let teams = Arc::new(InMemoryTeamRepository::new());

        Fixture {
            service: TeamService::new(teams.clone(), profiles.clone()),
            profiles,
            teams,
        }
    }

    async fn profile(fixture: &Fixture, name: &str) -> Profile {
        let profile = Profile::new(
            ProfileId::generate(),
            format!("auth0|{}", name),
            name,
            format!("{}@example.com", name),
        )
        .unwrap();

        fixture.profiles.create(profile).await.unwrap()
    }

    async fn refreshed(fixture: &Fixture, profile: &Profile) -> Profile {
        fixture.profiles.get(profile.id()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_create_team_sets_leader_membership() {
        let fx = fixture();
        let leader = profile(&fx, "lena").await;

        let team = fx.service.create_team(&leader, "Falcons").await.unwrap();

        assert!(team.is_leader(leader.id()));
        assert!(team.is_member(leader.id()));
        assert_eq!(
            refreshed(&fx, &leader).await.current_team_id(),
            Some(team.id())
        );
    }

    #[tokio::test]
    async fn test_create_team_name_conflict() {
        let fx = fixture();
        let lena = profile(&fx, "lena").await;
        let mira = profile(&fx, "mira").await;

        fx.service.create_team(&lena, "Falcons").await.unwrap();
        let result = fx.service.create_team(&mira, "Falcons").await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_create_team_already_teamed() {
        let fx = fixture();
        let lena = profile(&fx, "lena").await;

        fx.service.create_team(&lena, "Falcons").await.unwrap();
        let lena = refreshed(&fx, &lena).await;

        let result = fx.service.create_team(&lena, "Ravens").await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_join_flow_approves_into_membership() {
        let fx = fixture();
        let lena = profile(&fx, "lena").await;
        let mira = profile(&fx, "mira").await;

        let team = fx.service.create_team(&lena, "Falcons").await.unwrap();
        fx.service.request_join(&mira, team.id()).await.unwrap();

        let team = fx
            .service
            .approve_join(&lena, team.id(), mira.id())
            .await
            .unwrap();

        assert!(team.is_member(mira.id()));
        assert!(team.join_requests().is_empty());
        assert_eq!(
            refreshed(&fx, &mira).await.current_team_id(),
            Some(team.id())
        );
    }

    #[tokio::test]
    async fn test_approve_requires_leader() {
        let fx = fixture();
        let lena = profile(&fx, "lena").await;
        let mira = profile(&fx, "mira").await;
        let noor = profile(&fx, "noor").await;

        let team = fx.service.create_team(&lena, "Falcons").await.unwrap();
        fx.service.request_join(&mira, team.id()).await.unwrap();

        let result = fx.service.approve_join(&noor, team.id(), mira.id()).await;
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_reject_clears_request_only() {
        let fx = fixture();
        let lena = profile(&fx, "lena").await;
        let mira = profile(&fx, "mira").await;

        let team = fx.service.create_team(&lena, "Falcons").await.unwrap();
        fx.service.request_join(&mira, team.id()).await.unwrap();

        let team = fx
            .service
            .reject_join(&lena, team.id(), mira.id())
            .await
            .unwrap();

        assert!(team.join_requests().is_empty());
        assert!(!team.is_member(mira.id()));
        assert!(refreshed(&fx, &mira).await.current_team_id().is_none());
    }

    #[tokio::test]
    async fn test_invite_and_cancel() {
        let fx = fixture();
        let lena = profile(&fx, "lena").await;
        let mira = profile(&fx, "mira").await;

        let team = fx.service.create_team(&lena, "Falcons").await.unwrap();

        let invited = fx
            .service
            .invite(&lena, team.id(), mira.id())
            .await
            .unwrap();
        assert!(invited.invitations().contains(team.id()));

        // Idempotent
        fx.service.invite(&lena, team.id(), mira.id()).await.unwrap();

        fx.service
            .cancel_invite(&lena, team.id(), mira.id())
            .await
            .unwrap();
        assert!(refreshed(&fx, &mira).await.invitations().is_empty());

        let again = fx.service.cancel_invite(&lena, team.id(), mira.id()).await;
        assert!(matches!(again, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_member_leave_detaches_only_caller() {
        let fx = fixture();
        let lena = profile(&fx, "lena").await;
        let mira = profile(&fx, "mira").await;

        let team = fx.service.create_team(&lena, "Falcons").await.unwrap();
        fx.service.request_join(&mira, team.id()).await.unwrap();
        fx.service
            .approve_join(&lena, team.id(), mira.id())
            .await
            .unwrap();

        let mira = refreshed(&fx, &mira).await;
        fx.service.leave_or_disband(&mira).await.unwrap();

        let team = fx.service.get(team.id()).await.unwrap();
        assert!(!team.is_member(mira.id()));
        assert!(team.is_member(lena.id()));
        assert!(refreshed(&fx, &mira).await.current_team_id().is_none());
    }

    #[tokio::test]
    async fn test_leader_leave_disbands_and_cascades() {
        let fx = fixture();
        let lena = profile(&fx, "lena").await;
        let mira = profile(&fx, "mira").await;
        let noor = profile(&fx, "noor").await;

        let team = fx.service.create_team(&lena, "Falcons").await.unwrap();
        fx.service.request_join(&mira, team.id()).await.unwrap();
        fx.service
            .approve_join(&lena, team.id(), mira.id())
            .await
            .unwrap();
        fx.service.invite(&lena, team.id(), noor.id()).await.unwrap();

        let lena = refreshed(&fx, &lena).await;
        fx.service.leave_or_disband(&lena).await.unwrap();

        assert!(fx.teams.get(team.id()).await.unwrap().is_none());
        assert!(refreshed(&fx, &lena).await.current_team_id().is_none());
        assert!(refreshed(&fx, &mira).await.current_team_id().is_none());
        assert!(refreshed(&fx, &noor).await.invitations().is_empty());
    }

    #[tokio::test]
    async fn test_locked_team_freezes_membership() {
        let fx = fixture();
        let lena = profile(&fx, "lena").await;
        let mira = profile(&fx, "mira").await;
        let noor = profile(&fx, "noor").await;

        let team = fx.service.create_team(&lena, "Falcons").await.unwrap();
        fx.service.request_join(&mira, team.id()).await.unwrap();
        fx.service
            .approve_join(&lena, team.id(), mira.id())
            .await
            .unwrap();

        fx.teams.lock(team.id()).await.unwrap();

        let join = fx.service.request_join(&noor, team.id()).await;
        assert!(matches!(join, Err(DomainError::Locked { .. })));

        let invite = fx.service.invite(&lena, team.id(), noor.id()).await;
        assert!(matches!(invite, Err(DomainError::Locked { .. })));
        assert!(refreshed(&fx, &noor).await.invitations().is_empty());

        let mira = refreshed(&fx, &mira).await;
        let leave = fx.service.leave_or_disband(&mira).await;
        assert!(matches!(leave, Err(DomainError::Locked { .. })));

        let lena = refreshed(&fx, &lena).await;
        let disband = fx.service.leave_or_disband(&lena).await;
        assert!(matches!(disband, Err(DomainError::Locked { .. })));
    }

    #[tokio::test]
    async fn test_approve_rejects_requester_already_teamed() {
        let fx = fixture();
        let lena = profile(&fx, "lena").await;
        let noor = profile(&fx, "noor").await;
        let mira = profile(&fx, "mira").await;

        let falcons = fx.service.create_team(&lena, "Falcons").await.unwrap();
        let ravens = fx.service.create_team(&noor, "Ravens").await.unwrap();

        fx.service.request_join(&mira, falcons.id()).await.unwrap();
        fx.service.request_join(&mira, ravens.id()).await.unwrap();

        fx.service
            .approve_join(&lena, falcons.id(), mira.id())
            .await
            .unwrap();

        // The second request went stale the moment the first approval
        // landed; honoring it would put mira on two teams.
        let second = fx.service.approve_join(&noor, ravens.id(), mira.id()).await;
        assert!(matches!(second, Err(DomainError::Conflict { .. })));

        let ravens = fx.service.get(ravens.id()).await.unwrap();
        assert!(!ravens.is_member(mira.id()));
        assert!(ravens.join_requests().is_empty());
        assert_eq!(
            refreshed(&fx, &mira).await.current_team_id(),
            Some(falcons.id())
        );
    }

    #[tokio::test]
    async fn test_request_join_while_teamed() {
        let fx = fixture();
        let lena = profile(&fx, "lena").await;
        let mira = profile(&fx, "mira").await;

        fx.service.create_team(&lena, "Falcons").await.unwrap();
        let ravens = fx.service.create_team(&mira, "Ravens").await.unwrap();

        let lena = refreshed(&fx, &lena).await;
        let result = fx.service.request_join(&lena, ravens.id()).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }
}
