//! Registration repository trait

use async_trait::async_trait;

use super::entity::{ManualVerification, PaymentStatus, Registration, RegistrationId};
use crate::domain::event::EventId;
use crate::domain::profile::ProfileId;
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Outcome of the guarded paid transition
#[derive(Debug, Clone)]
pub enum PaidOutcome {
    /// This call performed the transition
    Transitioned(Registration),
    /// The registration was already paid; nothing changed
    AlreadyPaid(Registration),
}

impl PaidOutcome {
    pub fn registration(&self) -> &Registration {
        match self {
            Self::Transitioned(reg) | Self::AlreadyPaid(reg) => reg,
        }
    }
}

/// Query parameters for the admin registration listing
#[derive(Debug, Clone, Default)]
pub struct RegistrationQuery {
    /// Filter by event
    pub event_id: Option<EventId>,
    /// Filter by payment status
    pub status: Option<PaymentStatus>,
}

impl RegistrationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(mut self, event_id: EventId) -> Self {
        self.event_id = Some(event_id);
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Repository for registrations and their payment lifecycle
///
/// `create` enforces (team, event) uniqueness as a checked-then-inserted
/// atomic operation; `mark_paid` is a single compare-and-set on
/// `payment_status != paid`. Two racing calls of either can never both
/// succeed.
#[async_trait]
pub trait RegistrationRepository: Send + Sync + std::fmt::Debug {
    /// Get a registration by ID
    async fn get(&self, id: &RegistrationId) -> Result<Option<Registration>, DomainError>;

    /// Create a new registration; conflicts when the (team, event) pair
    /// already has one
    async fn create(&self, registration: Registration) -> Result<Registration, DomainError>;

    /// Look up a registration by its gateway order identifier
    async fn find_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<Registration>, DomainError>;

    /// Guarded initiated -> pending transition for the given order
    async fn mark_pending(&self, order_id: &str) -> Result<Registration, DomainError>;

    /// Atomic paid transition: updates only while `payment_status != paid`,
    /// otherwise reports `AlreadyPaid` without touching state
    async fn mark_paid(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<PaidOutcome, DomainError>;

    /// Apply an admin override in a single atomic write
    async fn apply_manual_verification(
        &self,
        id: &RegistrationId,
        verification: ManualVerification,
    ) -> Result<Registration, DomainError>;

    /// Guarded check-in flag flip
    async fn check_in(&self, id: &RegistrationId) -> Result<Registration, DomainError>;

    /// Registrations whose team is one of the given teams
    async fn list_for_teams(&self, team_ids: &[TeamId])
        -> Result<Vec<Registration>, DomainError>;

    /// Registrations whose roster contains the given profile
    async fn list_for_member(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<Registration>, DomainError>;

    /// Unrestricted filtered listing (admin only; callers gate access)
    async fn list(&self, query: &RegistrationQuery) -> Result<Vec<Registration>, DomainError>;
}
