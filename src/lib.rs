//! Event Registration API
//!
//! Team formation and event registration with payment verification:
//! - Teams with join requests, invitations and an irreversible lock
//! - One registration per (team, event) pair with an audited payment
//!   lifecycle
//! - Gateway callback verification (HMAC) and admin manual override

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use infrastructure::event::EventService;
use infrastructure::identity::IdentityService;
use infrastructure::payment::PaymentService;
use infrastructure::registration::RegistrationService;
use infrastructure::storage::Repositories;
use infrastructure::team::TeamService;

/// Build the application state from configuration.
///
/// Store handles are constructed once here and passed into each service;
/// there is no ambient registry.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config.storage_config()?;
    let repositories = Repositories::connect(&storage_config).await?;

    Ok(build_app_state(
        repositories,
        config.payment.webhook_secret.clone(),
    ))
}

/// Wire services over an existing repository bundle
pub fn build_app_state(repositories: Repositories, webhook_secret: String) -> AppState {
    let identity_service = Arc::new(IdentityService::new(repositories.profiles.clone()));
    let team_service = Arc::new(TeamService::new(
        repositories.teams.clone(),
        repositories.profiles.clone(),
    ));
    let event_service = Arc::new(EventService::new(repositories.events.clone()));
    let registration_service = Arc::new(RegistrationService::new(
        repositories.registrations.clone(),
        repositories.events.clone(),
        repositories.teams.clone(),
    ));
    let payment_service = Arc::new(PaymentService::new(
        repositories.registrations,
        repositories.teams,
        webhook_secret,
    ));

    AppState {
        identity_service,
        team_service,
        event_service,
        registration_service,
        payment_service,
    }
}

#[cfg(test)]
mod tests {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    use super::*;
    use crate::domain::profile::{Profile, ProfileId, UserRole};
    use crate::domain::registration::PaymentStatus;
    use crate::domain::DomainError;
    use crate::infrastructure::event::CreateEventRequest;
    use crate::infrastructure::registration::CreateRegistrationRequest;

    const SECRET: &str = "e2e-secret";

    fn sign(order_id: &str, payment_id: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[tokio::test]
    async fn test_build_app_state_in_memory() {
        let state = build_app_state(Repositories::in_memory(), "secret".to_string());

        // Services share the same backing stores
        let events = state.event_service.list().await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_full_registration_lifecycle() {
        let repositories = Repositories::in_memory();
        let state = build_app_state(repositories.clone(), SECRET.to_string());

        let admin = Profile::new(
            ProfileId::generate(),
            "auth0|admin",
            "Root",
            "root@example.com",
        )
        .unwrap()
        .with_role(UserRole::Admin);
        let admin = repositories.profiles.create(admin).await.unwrap();

        let leader = state
            .identity_service
            .resolve_or_register("auth0|leader", "Lena", "lena@example.com")
            .await
            .unwrap();
        let member = state
            .identity_service
            .resolve_or_register("auth0|member", "Milo", "milo@example.com")
            .await
            .unwrap();

        let event = state
            .event_service
            .create(
                &admin,
                CreateEventRequest {
                    name: "Hackathon".to_string(),
                    entry_fee: 50_000,
                    team_event: true,
                    min_roster: Some(2),
                    max_roster: Some(4),
                },
            )
            .await
            .unwrap();

        let team = state
            .team_service
            .create_team(&leader, "Falcons")
            .await
            .unwrap();
        state
            .team_service
            .request_join(&member, team.id())
            .await
            .unwrap();
        state
            .team_service
            .approve_join(&leader, team.id(), member.id())
            .await
            .unwrap();

        let member = state
            .identity_service
            .resolve("auth0|member")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(member.current_team_id(), Some(team.id()));

        let registration = state
            .registration_service
            .create_registration(
                &leader,
                CreateRegistrationRequest {
                    event_id: event.id().clone(),
                    team_id: Some(team.id().clone()),
                    selected_members: vec![leader.id().clone(), member.id().clone()],
                    razorpay_order_id: "order_e2e_1".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(registration.payment_status(), PaymentStatus::Initiated);

        state
            .registration_service
            .mark_pending("order_e2e_1")
            .await
            .unwrap();

        let signature = sign("order_e2e_1", "pay_e2e_1");
        let paid = state
            .payment_service
            .verify_gateway_callback("order_e2e_1", "pay_e2e_1", &signature)
            .await
            .unwrap();
        assert_eq!(paid.payment_status(), PaymentStatus::Paid);
        assert_eq!(paid.amount_paid(), 50_000);

        // Payment locks the team
        let team = state.team_service.get(team.id()).await.unwrap();
        assert!(team.is_locked());

        // The webhook and the client callback can both land
        let again = state
            .payment_service
            .verify_gateway_callback("order_e2e_1", "pay_e2e_1", &signature)
            .await
            .unwrap();
        assert_eq!(again.payment_attempts().len(), paid.payment_attempts().len());

        // Membership is frozen once the team is locked
        let leader = state
            .identity_service
            .resolve("auth0|leader")
            .await
            .unwrap()
            .unwrap();
        let err = state
            .team_service
            .leave_or_disband(&leader)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Locked { .. }));

        // The caller sees the registration with the payment trail
        let mine = state
            .registration_service
            .find_for_user(&member)
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id(), registration.id());
    }
}
