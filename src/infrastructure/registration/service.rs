//! Registration ledger service
//!
//! Owns one registration per (team, event) pair and its payment
//! lifecycle. Uniqueness is enforced by the repository's atomic create;
//! this service validates the roster against the team and the event's
//! bounds before the write.

use std::sync::Arc;

use tracing::info;

use crate::domain::event::{EventId, EventRepository};
use crate::domain::profile::{require_admin, Profile, ProfileId};
use crate::domain::registration::{
    Registration, RegistrationId, RegistrationQuery, RegistrationRepository,
};
use crate::domain::team::{TeamId, TeamRepository};
use crate::domain::DomainError;

/// Request for creating a new registration
#[derive(Debug, Clone)]
pub struct CreateRegistrationRequest {
    pub event_id: EventId,
    pub team_id: Option<TeamId>,
    pub selected_members: Vec<ProfileId>,
    pub razorpay_order_id: String,
}

/// Registration ledger service
#[derive(Debug, Clone)]
pub struct RegistrationService {
    registrations: Arc<dyn RegistrationRepository>,
    events: Arc<dyn EventRepository>,
    teams: Arc<dyn TeamRepository>,
}

impl RegistrationService {
    pub fn new(
        registrations: Arc<dyn RegistrationRepository>,
        events: Arc<dyn EventRepository>,
        teams: Arc<dyn TeamRepository>,
    ) -> Self {
        Self {
            registrations,
            events,
            teams,
        }
    }

    /// Create a registration for the caller's team or an individual roster
    pub async fn create_registration(
        &self,
        caller: &Profile,
        request: CreateRegistrationRequest,
    ) -> Result<Registration, DomainError> {
        let event = self
            .events
            .get(&request.event_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Event '{}' not found", request.event_id))
            })?;

        if !event.roster_size_allowed(request.selected_members.len()) {
            return Err(DomainError::validation(format!(
                "Roster of {} is outside the bounds of event '{}'",
                request.selected_members.len(),
                event.name()
            )));
        }

        match &request.team_id {
            Some(team_id) => {
                if !event.is_team_event() {
                    return Err(DomainError::validation(format!(
                        "Event '{}' takes individual entries, not teams",
                        event.name()
                    )));
                }

                let team = self.teams.get(team_id).await?.ok_or_else(|| {
                    DomainError::not_found(format!("Team '{}' not found", team_id))
                })?;

                if !team.is_member(caller.id()) {
                    return Err(DomainError::forbidden(format!(
                        "Profile '{}' is not a member of team '{}'",
                        caller.id(),
                        team_id
                    )));
                }

                if let Some(outsider) = request
                    .selected_members
                    .iter()
                    .find(|m| !team.is_member(m))
                {
                    return Err(DomainError::validation(format!(
                        "Selected member '{}' does not belong to team '{}'",
                        outsider, team_id
                    )));
                }
            }
            None => {
                if event.is_team_event() {
                    return Err(DomainError::validation(format!(
                        "Event '{}' requires a team registration",
                        event.name()
                    )));
                }

                if !request.selected_members.contains(caller.id()) {
                    return Err(DomainError::validation(
                        "An individual entry must include the caller in its roster",
                    ));
                }
            }
        }

        info!(
            event = %request.event_id,
            team = ?request.team_id.as_ref().map(|t| t.as_str()),
            amount = event.entry_fee(),
            "Creating registration"
        );

        let registration = Registration::new(
            RegistrationId::generate(),
            request.team_id,
            request.event_id,
            request.selected_members,
            event.entry_fee(),
            request.razorpay_order_id,
        )?;

        self.registrations.create(registration).await
    }

    /// Registrations the profile can see as a team member or a roster entry
    pub async fn find_for_user(&self, profile: &Profile) -> Result<Vec<Registration>, DomainError> {
        let mut team_ids = Vec::new();

        if let Some(team_id) = profile.current_team_id() {
            team_ids.push(team_id.clone());
        }

        if let Some(team) = self.teams.find_by_member(profile.id()).await? {
            if !team_ids.contains(team.id()) {
                team_ids.push(team.id().clone());
            }
        }

        let mut result = self.registrations.list_for_teams(&team_ids).await?;

        for reg in self.registrations.list_for_member(profile.id()).await? {
            if !result.iter().any(|r| r.id() == reg.id()) {
                result.push(reg);
            }
        }

        result.sort_by_key(|r| r.created_at());
        Ok(result)
    }

    /// Unrestricted filtered listing; admin only
    pub async fn list_for_admin(
        &self,
        caller: &Profile,
        query: RegistrationQuery,
    ) -> Result<Vec<Registration>, DomainError> {
        require_admin(caller)?;
        self.registrations.list(&query).await
    }

    /// Record that a gateway order was handed to the client
    pub async fn mark_pending(&self, order_id: &str) -> Result<Registration, DomainError> {
        info!(order = %order_id, "Marking registration pending");
        self.registrations.mark_pending(order_id).await
    }

    /// Flip the check-in flag; admin only, settled registrations only
    pub async fn check_in(
        &self,
        caller: &Profile,
        id: &RegistrationId,
    ) -> Result<Registration, DomainError> {
        require_admin(caller)?;

        info!(registration = %id, "Checking in registration");
        self.registrations.check_in(id).await
    }

    pub async fn get(&self, id: &RegistrationId) -> Result<Registration, DomainError> {
        self.registrations
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Registration '{}' not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::Event;
    use crate::domain::profile::UserRole;
    use crate::domain::registration::PaymentStatus;
    use crate::domain::team::Team;
    use crate::infrastructure::event::InMemoryEventRepository;
    use crate::infrastructure::registration::InMemoryRegistrationRepository;
    use crate::infrastructure::team::InMemoryTeamRepository;

    struct Fixture {
        service: RegistrationService,
        teams: Arc<InMemoryTeamRepository>,
        events: Arc<InMemoryEventRepository>,
        registrations: Arc<InMemoryRegistrationRepository>,
    }

    fn fixture() -> Fixture {
        let registrations = Arc::new(InMemoryRegistrationRepository::new());
        let events = Arc::new(InMemoryEventRepository::new());
        let teams = Arc::new(InMemoryTeamRepository::new());

        Fixture {
            service: RegistrationService::new(
                registrations.clone(),
                events.clone(),
                teams.clone(),
            ),
            teams,
            events,
            registrations,
        }
    }

    fn profile(name: &str) -> Profile {
        Profile::new(
            ProfileId::generate(),
            format!("auth0|{}", name),
            name,
            format!("{}@example.com", name),
        )
        .unwrap()
    }

    async fn team_event(fx: &Fixture) -> Event {
        let event = Event::new(EventId::generate(), "Robo Race", 500, true).unwrap();
        fx.events.create(event).await.unwrap()
    }

    async fn team_with(fx: &Fixture, leader: &Profile, members: &[&Profile]) -> Team {
        let mut team =
            Team::new(TeamId::generate(), "Falcons", leader.id().clone()).unwrap();
        for member in members {
            team.request_join(member.id().clone()).unwrap();
            team.approve_request(member.id()).unwrap();
        }

        fx.teams.create(team).await.unwrap()
    }

    fn request(event: &Event, team: &Team, roster: Vec<ProfileId>) -> CreateRegistrationRequest {
        CreateRegistrationRequest {
            event_id: event.id().clone(),
            team_id: Some(team.id().clone()),
            selected_members: roster,
            razorpay_order_id: "order_abc".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_registration_initiated() {
        let fx = fixture();
        let leader = profile("lena");
        let event = team_event(&fx).await;
        let team = team_with(&fx, &leader, &[]).await;

        let reg = fx
            .service
            .create_registration(&leader, request(&event, &team, vec![leader.id().clone()]))
            .await
            .unwrap();

        assert_eq!(reg.payment_status(), PaymentStatus::Initiated);
        assert_eq!(reg.amount_expected(), 500);
        assert_eq!(reg.payment_attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_pair_conflicts() {
        let fx = fixture();
        let leader = profile("lena");
        let event = team_event(&fx).await;
        let team = team_with(&fx, &leader, &[]).await;

        fx.service
            .create_registration(&leader, request(&event, &team, vec![leader.id().clone()]))
            .await
            .unwrap();

        let result = fx
            .service
            .create_registration(&leader, request(&event, &team, vec![leader.id().clone()]))
            .await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_creates_yield_one_success() {
        let fx = fixture();
        let leader = profile("lena");
        let event = team_event(&fx).await;
        let team = team_with(&fx, &leader, &[]).await;

        let a = {
            let service = fx.service.clone();
            let leader = leader.clone();
            let request = request(&event, &team, vec![leader.id().clone()]);
            tokio::spawn(async move { service.create_registration(&leader, request).await })
        };
        let b = {
            let service = fx.service.clone();
            let leader = leader.clone();
            let request = request(&event, &team, vec![leader.id().clone()]);
            tokio::spawn(async move { service.create_registration(&leader, request).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(DomainError::Conflict { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
    }

    #[tokio::test]
    async fn test_roster_must_be_team_subset() {
        let fx = fixture();
        let leader = profile("lena");
        let outsider = profile("noor");
        let event = team_event(&fx).await;
        let team = team_with(&fx, &leader, &[]).await;

        let result = fx
            .service
            .create_registration(
                &leader,
                request(&event, &team, vec![leader.id().clone(), outsider.id().clone()]),
            )
            .await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_non_member_cannot_register_team() {
        let fx = fixture();
        let leader = profile("lena");
        let stranger = profile("noor");
        let event = team_event(&fx).await;
        let team = team_with(&fx, &leader, &[]).await;

        let result = fx
            .service
            .create_registration(&stranger, request(&event, &team, vec![leader.id().clone()]))
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_individual_entry_for_solo_event() {
        let fx = fixture();
        let asha = profile("asha");
        let event = Event::new(EventId::generate(), "Chess", 100, false).unwrap();
        let event = fx.events.create(event).await.unwrap();

        let reg = fx
            .service
            .create_registration(
                &asha,
                CreateRegistrationRequest {
                    event_id: event.id().clone(),
                    team_id: None,
                    selected_members: vec![asha.id().clone()],
                    razorpay_order_id: "order_solo".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(reg.team_id().is_none());
        assert_eq!(reg.amount_expected(), 100);
    }

    #[tokio::test]
    async fn test_find_for_user_merges_team_and_roster() {
        let fx = fixture();
        let lena = profile("lena");
        let mira = profile("mira");
        let event = team_event(&fx).await;
        let team = team_with(&fx, &lena, &[&mira]).await;

        fx.service
            .create_registration(&lena, request(&event, &team, vec![mira.id().clone()]))
            .await
            .unwrap();

        // Mira has no current_team_id recorded but sits on the roster
        let seen = fx.service.find_for_user(&mira).await.unwrap();
        assert_eq!(seen.len(), 1);

        let stranger = profile("noor");
        assert!(fx.service.find_for_user(&stranger).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_listing_is_gated() {
        let fx = fixture();
        let user = profile("asha");

        let result = fx
            .service
            .list_for_admin(&user, RegistrationQuery::new())
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));

        let admin = profile("root").with_role(UserRole::Superadmin);
        let listed = fx
            .service
            .list_for_admin(&admin, RegistrationQuery::new())
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_check_in_requires_settled_status() {
        let fx = fixture();
        let leader = profile("lena");
        let admin = profile("root").with_role(UserRole::Admin);
        let event = team_event(&fx).await;
        let team = team_with(&fx, &leader, &[]).await;

        let reg = fx
            .service
            .create_registration(&leader, request(&event, &team, vec![leader.id().clone()]))
            .await
            .unwrap();

        let early = fx.service.check_in(&admin, reg.id()).await;
        assert!(matches!(early, Err(DomainError::Conflict { .. })));

        fx.registrations
            .mark_paid("order_abc", "pay_1", "sig")
            .await
            .unwrap();

        let checked = fx.service.check_in(&admin, reg.id()).await.unwrap();
        assert!(checked.is_checked_in());

        let twice = fx.service.check_in(&admin, reg.id()).await;
        assert!(matches!(twice, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_mark_pending_transition() {
        let fx = fixture();
        let leader = profile("lena");
        let event = team_event(&fx).await;
        let team = team_with(&fx, &leader, &[]).await;

        fx.service
            .create_registration(&leader, request(&event, &team, vec![leader.id().clone()]))
            .await
            .unwrap();

        let reg = fx.service.mark_pending("order_abc").await.unwrap();
        assert_eq!(reg.payment_status(), PaymentStatus::Pending);

        let again = fx.service.mark_pending("order_abc").await;
        assert!(matches!(again, Err(DomainError::Conflict { .. })));
    }
}
