//! Payment verification service
//!
//! Two entry paths converge on the same registration transition: the
//! gateway callback (signature-verified) and the admin manual override.
//! Either may arrive first; the repository's guarded paid transition
//! keeps double deliveries idempotent.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{info, warn};

use crate::domain::profile::{require_admin, Profile};
use crate::domain::registration::{
    ManualAction, ManualVerification, PaidOutcome, Registration, RegistrationId,
    RegistrationRepository,
};
use crate::domain::team::TeamRepository;
use crate::domain::DomainError;

type HmacSha256 = Hmac<Sha256>;

/// Payment verifier
#[derive(Debug, Clone)]
pub struct PaymentService {
    registrations: Arc<dyn RegistrationRepository>,
    teams: Arc<dyn TeamRepository>,
    webhook_secret: String,
}

impl PaymentService {
    pub fn new(
        registrations: Arc<dyn RegistrationRepository>,
        teams: Arc<dyn TeamRepository>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            registrations,
            teams,
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Recompute the expected signature over `order_id|payment_id` and
    /// compare in constant time. The error carries no signature material.
    fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        client_signature: &str,
    ) -> Result<(), DomainError> {
        let provided =
            hex::decode(client_signature).map_err(|_| DomainError::SignatureMismatch)?;

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|e| DomainError::internal(format!("Invalid HMAC key: {}", e)))?;
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());

        mac.verify_slice(&provided)
            .map_err(|_| DomainError::SignatureMismatch)
    }

    /// Handle a gateway payment confirmation.
    ///
    /// The signature check runs before any store access. A registration
    /// already paid is a no-op success so the webhook and the client
    /// callback can both land.
    pub async fn verify_gateway_callback(
        &self,
        order_id: &str,
        payment_id: &str,
        client_signature: &str,
    ) -> Result<Registration, DomainError> {
        if let Err(e) = self.verify_signature(order_id, payment_id, client_signature) {
            warn!(order = %order_id, "Gateway signature rejected");
            return Err(e);
        }

        let outcome = self
            .registrations
            .mark_paid(order_id, payment_id, client_signature)
            .await?;

        match outcome {
            PaidOutcome::Transitioned(registration) => {
                info!(
                    registration = %registration.id(),
                    order = %order_id,
                    "Payment confirmed"
                );

                if let Some(team_id) = registration.team_id() {
                    self.teams.lock(team_id).await?;
                }

                Ok(registration)
            }
            PaidOutcome::AlreadyPaid(registration) => {
                info!(
                    registration = %registration.id(),
                    order = %order_id,
                    "Duplicate payment callback ignored"
                );

                Ok(registration)
            }
        }
    }

    /// Admin override: `verify` marks the registration paid out-of-band
    /// and locks the team; `reject` marks it failed and leaves any lock
    /// in place.
    pub async fn manual_verify(
        &self,
        caller: &Profile,
        registration_id: &RegistrationId,
        action: &str,
        notes: &str,
    ) -> Result<Registration, DomainError> {
        require_admin(caller)?;

        let action: ManualAction = action.parse()?;

        if notes.trim().is_empty() {
            return Err(DomainError::validation(
                "Manual verification requires an audit note",
            ));
        }

        info!(
            registration = %registration_id,
            admin = %caller.id(),
            action = %action,
            "Applying manual verification"
        );

        let verification = ManualVerification::new(caller.id().clone(), action, notes);
        let registration = self
            .registrations
            .apply_manual_verification(registration_id, verification)
            .await?;

        if action == ManualAction::Verify {
            if let Some(team_id) = registration.team_id() {
                self.teams.lock(team_id).await?;
            }
        }

        Ok(registration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::EventId;
    use crate::domain::profile::{ProfileId, UserRole};
    use crate::domain::registration::{PaymentStatus, Registration};
    use crate::domain::team::{Team, TeamId};
    use crate::infrastructure::registration::InMemoryRegistrationRepository;
    use crate::infrastructure::team::InMemoryTeamRepository;

    const SECRET: &str = "test-webhook-secret";

    struct Fixture {
        service: PaymentService,
        registrations: Arc<InMemoryRegistrationRepository>,
        teams: Arc<InMemoryTeamRepository>,
    }

    fn fixture() -> Fixture {
        let registrations = Arc::new(InMemoryRegistrationRepository::new());
        let teams = Arc::new(InMemoryTeamRepository::new());

        Fixture {
            service: PaymentService::new(registrations.clone(), teams.clone(), SECRET),
            registrations,
            teams,
        }
    }

    fn sign(order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn admin() -> Profile {
        Profile::new(
            ProfileId::generate(),
            "auth0|admin",
            "Root",
            "root@example.com",
        )
        .unwrap()
        .with_role(UserRole::Admin)
    }

    async fn seed(fx: &Fixture, order_id: &str) -> (Team, Registration) {
        let leader = ProfileId::generate();
        let team = Team::new(TeamId::generate(), "Falcons", leader.clone()).unwrap();
        let team = fx.teams.create(team).await.unwrap();

        let registration = Registration::new(
            crate::domain::registration::RegistrationId::generate(),
            Some(team.id().clone()),
            EventId::generate(),
            vec![leader],
            500,
            order_id,
        )
        .unwrap();
        let registration = fx.registrations.create(registration).await.unwrap();

        (team, registration)
    }

    #[tokio::test]
    async fn test_valid_callback_pays_and_locks() {
        let fx = fixture();
        let (team, _) = seed(&fx, "order_1").await;

        let signature = sign("order_1", "pay_1");
        let reg = fx
            .service
            .verify_gateway_callback("order_1", "pay_1", &signature)
            .await
            .unwrap();

        assert_eq!(reg.payment_status(), PaymentStatus::Paid);
        assert_eq!(reg.razorpay_payment_id(), Some("pay_1"));
        assert!(fx.teams.get(team.id()).await.unwrap().unwrap().is_locked());
    }

    #[tokio::test]
    async fn test_tampered_signature_rejected_before_store() {
        let fx = fixture();
        let (_, reg) = seed(&fx, "order_1").await;

        let mut signature = sign("order_1", "pay_1");
        signature.replace_range(0..2, "00");

        let result = fx
            .service
            .verify_gateway_callback("order_1", "pay_1", &signature)
            .await;
        assert!(matches!(result, Err(DomainError::SignatureMismatch)));

        // State untouched
        let stored = fx.registrations.get(reg.id()).await.unwrap().unwrap();
        assert_eq!(stored.payment_status(), PaymentStatus::Initiated);
    }

    #[tokio::test]
    async fn test_signature_for_wrong_payment_rejected() {
        let fx = fixture();
        seed(&fx, "order_1").await;

        let signature = sign("order_1", "pay_other");
        let result = fx
            .service
            .verify_gateway_callback("order_1", "pay_1", &signature)
            .await;
        assert!(matches!(result, Err(DomainError::SignatureMismatch)));
    }

    #[tokio::test]
    async fn test_non_hex_signature_rejected() {
        let fx = fixture();
        seed(&fx, "order_1").await;

        let result = fx
            .service
            .verify_gateway_callback("order_1", "pay_1", "not-hex!")
            .await;
        assert!(matches!(result, Err(DomainError::SignatureMismatch)));
    }

    #[tokio::test]
    async fn test_double_callback_is_idempotent() {
        let fx = fixture();
        let (_, reg) = seed(&fx, "order_1").await;

        let signature = sign("order_1", "pay_1");
        let first = fx
            .service
            .verify_gateway_callback("order_1", "pay_1", &signature)
            .await
            .unwrap();
        let second = fx
            .service
            .verify_gateway_callback("order_1", "pay_1", &signature)
            .await
            .unwrap();

        assert_eq!(second.payment_status(), PaymentStatus::Paid);
        assert_eq!(
            first.payment_attempts().len(),
            second.payment_attempts().len()
        );

        let stored = fx.registrations.get(reg.id()).await.unwrap().unwrap();
        // Initial attempt plus exactly one paid attempt
        assert_eq!(stored.payment_attempts().len(), 2);
    }

    #[tokio::test]
    async fn test_callback_for_unknown_order() {
        let fx = fixture();

        let signature = sign("order_ghost", "pay_1");
        let result = fx
            .service
            .verify_gateway_callback("order_ghost", "pay_1", &signature)
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_manual_verify_marks_and_locks() {
        let fx = fixture();
        let (team, reg) = seed(&fx, "order_1").await;
        let admin = admin();

        let verified = fx
            .service
            .manual_verify(&admin, reg.id(), "verify", "bank transfer receipt #42")
            .await
            .unwrap();

        assert_eq!(verified.payment_status(), PaymentStatus::ManualVerified);
        assert_eq!(verified.amount_paid(), 500);

        let record = verified.manual_verification().unwrap();
        assert_eq!(&record.verified_by, admin.id());
        assert!(fx.teams.get(team.id()).await.unwrap().unwrap().is_locked());
    }

    #[tokio::test]
    async fn test_manual_reject_keeps_lock_state() {
        let fx = fixture();
        let (team, reg) = seed(&fx, "order_1").await;
        let admin = admin();

        let rejected = fx
            .service
            .manual_verify(&admin, reg.id(), "reject", "screenshot invalid")
            .await
            .unwrap();

        assert_eq!(rejected.payment_status(), PaymentStatus::Failed);
        assert!(!fx.teams.get(team.id()).await.unwrap().unwrap().is_locked());
        assert_eq!(
            rejected.manual_verification().unwrap().notes,
            "screenshot invalid"
        );
    }

    #[tokio::test]
    async fn test_second_override_keeps_prior_stamp() {
        let fx = fixture();
        let (_, reg) = seed(&fx, "order_1").await;
        let admin = admin();

        fx.service
            .manual_verify(&admin, reg.id(), "reject", "screenshot invalid")
            .await
            .unwrap();
        let corrected = fx
            .service
            .manual_verify(&admin, reg.id(), "verify", "receipt checked out after all")
            .await
            .unwrap();

        assert_eq!(corrected.payment_status(), PaymentStatus::ManualVerified);

        // Correcting a mistake appends a new stamp, it never edits one
        let stamps = corrected.manual_verifications();
        assert_eq!(stamps.len(), 2);
        assert_eq!(stamps[0].notes, "screenshot invalid");
        assert_eq!(stamps[1].notes, "receipt checked out after all");
        assert_eq!(
            corrected.manual_verification().unwrap().notes,
            "receipt checked out after all"
        );
    }

    #[tokio::test]
    async fn test_manual_verify_requires_admin() {
        let fx = fixture();
        let (_, reg) = seed(&fx, "order_1").await;

        let user = Profile::new(
            ProfileId::generate(),
            "auth0|user",
            "Asha",
            "asha@example.com",
        )
        .unwrap();

        let result = fx
            .service
            .manual_verify(&user, reg.id(), "verify", "note")
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_unknown_action_rejected() {
        let fx = fixture();
        let (_, reg) = seed(&fx, "order_1").await;

        let result = fx
            .service
            .manual_verify(&admin(), reg.id(), "approve", "note")
            .await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_empty_notes_rejected() {
        let fx = fixture();
        let (_, reg) = seed(&fx, "order_1").await;

        let result = fx
            .service
            .manual_verify(&admin(), reg.id(), "verify", "  ")
            .await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }
}
