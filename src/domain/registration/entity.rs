//! Registration entity and the payment status machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::event::EventId;
use crate::domain::profile::ProfileId;
use crate::domain::team::TeamId;
use crate::domain::DomainError;

const MAX_REGISTRATION_ID_LENGTH: usize = 50;

/// Registration identifier - alphanumeric + hyphens, max 50 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistrationId(String);

impl RegistrationId {
    /// Create a new RegistrationId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();

        if id.is_empty() || id.len() > MAX_REGISTRATION_ID_LENGTH {
            return Err(DomainError::invalid_id(format!(
                "Registration ID must be 1-{} characters",
                MAX_REGISTRATION_ID_LENGTH
            )));
        }

        if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomainError::invalid_id(
                "Registration ID can only contain alphanumeric characters and hyphens",
            ));
        }

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

impl TryFrom<String> for RegistrationId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegistrationId> for String {
    fn from(id: RegistrationId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payment lifecycle of a registration
///
/// initiated -> pending -> {paid, failed}; paid -> refunded.
/// Admin override can move any state to manual_verified or failed.
/// paid and manual_verified both freeze the team roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Registration created, gateway order handed out
    #[default]
    Initiated,
    /// Client took the order to the gateway, outcome not yet known
    Pending,
    /// Gateway confirmed the payment
    Paid,
    /// Payment failed or was rejected by an admin
    Failed,
    /// Paid amount was returned (mechanics out of scope)
    Refunded,
    /// Admin confirmed payment without a gateway signature
    ManualVerified,
}

impl PaymentStatus {
    /// Whether this status freezes the team roster
    pub fn locks_team(&self) -> bool {
        matches!(self, Self::Paid | Self::ManualVerified)
    }

    /// Whether the registration counts as settled for check-in purposes
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::ManualVerified)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initiated => write!(f, "initiated"),
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
            Self::Failed => write!(f, "failed"),
            Self::Refunded => write!(f, "refunded"),
            Self::ManualVerified => write!(f, "manual_verified"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiated" => Ok(Self::Initiated),
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            "manual_verified" => Ok(Self::ManualVerified),
            other => Err(DomainError::validation(format!(
                "Unknown payment status '{}'",
                other
            ))),
        }
    }
}

/// Admin override action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualAction {
    /// Mark the registration paid without a gateway signature
    Verify,
    /// Mark the registration failed
    Reject,
}

impl ManualAction {
    /// The payment status this action transitions to
    pub fn target_status(&self) -> PaymentStatus {
        match self {
            Self::Verify => PaymentStatus::ManualVerified,
            Self::Reject => PaymentStatus::Failed,
        }
    }
}

impl std::fmt::Display for ManualAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verify => write!(f, "verify"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

impl std::str::FromStr for ManualAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verify" => Ok(Self::Verify),
            "reject" => Ok(Self::Reject),
            other => Err(DomainError::validation(format!(
                "Unknown manual verification action '{}'",
                other
            ))),
        }
    }
}

/// One entry in the append-only payment audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAttempt {
    /// When the transition happened
    pub at: DateTime<Utc>,
    /// Status after the transition
    pub status: PaymentStatus,
    /// Gateway order involved, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Free-form note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PaymentAttempt {
    pub fn now(status: PaymentStatus) -> Self {
        Self {
            at: Utc::now(),
            status,
            order_id: None,
            note: None,
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Admin override record; append-only, never edited after the fact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualVerification {
    /// Admin who performed the override
    pub verified_by: ProfileId,
    /// When it was stamped
    pub verified_at: DateTime<Utc>,
    /// verify or reject
    pub action: ManualAction,
    /// Mandatory audit note
    pub notes: String,
}

impl ManualVerification {
    pub fn new(verified_by: ProfileId, action: ManualAction, notes: impl Into<String>) -> Self {
        Self {
            verified_by,
            verified_at: Utc::now(),
            action,
            notes: notes.into(),
        }
    }
}

/// Registration entity
///
/// One per (team, event) pair; status-transitioned, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Unique identifier
    id: RegistrationId,
    /// Registering team; absent for individual-entry events
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<TeamId>,
    /// Event being registered for
    event_id: EventId,
    /// Roster submitted for this event
    selected_members: Vec<ProfileId>,
    /// Current payment status
    payment_status: PaymentStatus,
    /// Expected amount in minor currency units
    amount_expected: i64,
    /// Amount actually confirmed
    amount_paid: i64,
    /// Gateway order identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    razorpay_order_id: Option<String>,
    /// Gateway payment identifier, set on confirmation
    #[serde(skip_serializing_if = "Option::is_none")]
    razorpay_payment_id: Option<String>,
    /// Gateway signature, set on confirmation
    #[serde(skip_serializing_if = "Option::is_none")]
    razorpay_signature: Option<String>,
    /// Append-only audit trail
    #[serde(default)]
    payment_attempts: Vec<PaymentAttempt>,
    /// Admin override records, oldest first; stamps are appended, never
    /// replaced
    #[serde(default)]
    manual_verifications: Vec<ManualVerification>,
    /// Whether the roster showed up at the event
    #[serde(default)]
    checked_in: bool,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Last update timestamp
    updated_at: DateTime<Utc>,
}

impl Registration {
    /// Create a new registration in the `initiated` state
    pub fn new(
        id: RegistrationId,
        team_id: Option<TeamId>,
        event_id: EventId,
        selected_members: Vec<ProfileId>,
        amount_expected: i64,
        razorpay_order_id: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if selected_members.is_empty() {
            return Err(DomainError::validation(
                "A registration needs at least one selected member",
            ));
        }

        if amount_expected < 0 {
            return Err(DomainError::validation(
                "Expected amount cannot be negative",
            ));
        }

        let order_id = razorpay_order_id.into();
        if order_id.is_empty() {
            return Err(DomainError::validation("Gateway order ID cannot be empty"));
        }

        let now = Utc::now();
        let initial_attempt =
            PaymentAttempt::now(PaymentStatus::Initiated).with_order_id(order_id.clone());

        Ok(Self {
            id,
            team_id,
            event_id,
            selected_members,
            payment_status: PaymentStatus::Initiated,
            amount_expected,
            amount_paid: 0,
            razorpay_order_id: Some(order_id),
            razorpay_payment_id: None,
            razorpay_signature: None,
            payment_attempts: vec![initial_attempt],
            manual_verifications: Vec::new(),
            checked_in: false,
            created_at: now,
            updated_at: now,
        })
    }

    // Getters

    pub fn id(&self) -> &RegistrationId {
        &self.id
    }

    pub fn team_id(&self) -> Option<&TeamId> {
        self.team_id.as_ref()
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn selected_members(&self) -> &[ProfileId] {
        &self.selected_members
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn amount_expected(&self) -> i64 {
        self.amount_expected
    }

    pub fn amount_paid(&self) -> i64 {
        self.amount_paid
    }

    pub fn razorpay_order_id(&self) -> Option<&str> {
        self.razorpay_order_id.as_deref()
    }

    pub fn razorpay_payment_id(&self) -> Option<&str> {
        self.razorpay_payment_id.as_deref()
    }

    pub fn razorpay_signature(&self) -> Option<&str> {
        self.razorpay_signature.as_deref()
    }

    pub fn payment_attempts(&self) -> &[PaymentAttempt] {
        &self.payment_attempts
    }

    /// The most recent admin override, if any
    pub fn manual_verification(&self) -> Option<&ManualVerification> {
        self.manual_verifications.last()
    }

    pub fn manual_verifications(&self) -> &[ManualVerification] {
        &self.manual_verifications
    }

    pub fn is_checked_in(&self) -> bool {
        self.checked_in
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the roster contains the given profile
    pub fn includes_member(&self, profile_id: &ProfileId) -> bool {
        self.selected_members.contains(profile_id)
    }

    // Transitions
    //
    // Repositories call these inside their atomic sections so both
    // backends produce identical state and audit entries.

    /// initiated -> pending: the order was handed to the client
    pub fn apply_pending(&mut self) -> Result<(), DomainError> {
        if self.payment_status != PaymentStatus::Initiated {
            return Err(DomainError::conflict(format!(
                "Registration '{}' is '{}', cannot move to pending",
                self.id, self.payment_status
            )));
        }

        self.payment_status = PaymentStatus::Pending;
        self.payment_attempts
            .push(PaymentAttempt::now(PaymentStatus::Pending));
        self.touch();
        Ok(())
    }

    /// Record a verified gateway payment.
    ///
    /// Callers must have ruled out `Paid` first; repositories do this in
    /// the same atomic operation that invokes the transition.
    pub fn apply_paid(
        &mut self,
        payment_id: impl Into<String>,
        signature: impl Into<String>,
    ) -> Result<(), DomainError> {
        if self.payment_status == PaymentStatus::Paid {
            return Err(DomainError::conflict(format!(
                "Registration '{}' is already paid",
                self.id
            )));
        }

        self.payment_status = PaymentStatus::Paid;
        self.razorpay_payment_id = Some(payment_id.into());
        self.razorpay_signature = Some(signature.into());
        self.amount_paid = self.amount_expected;

        let attempt = match self.razorpay_order_id.as_deref() {
            Some(order_id) => PaymentAttempt::now(PaymentStatus::Paid).with_order_id(order_id),
            None => PaymentAttempt::now(PaymentStatus::Paid),
        };
        self.payment_attempts.push(attempt);
        self.touch();
        Ok(())
    }

    /// Apply an admin override, stamping the audit record
    pub fn apply_manual(&mut self, verification: ManualVerification) {
        let target = verification.action.target_status();

        self.payment_status = target;
        if target == PaymentStatus::ManualVerified {
            self.amount_paid = self.amount_expected;
        }

        self.payment_attempts.push(
            PaymentAttempt::now(target).with_note(verification.notes.clone()),
        );
        self.manual_verifications.push(verification);
        self.touch();
    }

    /// Flip the check-in flag; settled registrations only, once
    pub fn apply_check_in(&mut self) -> Result<(), DomainError> {
        if !self.payment_status.is_settled() {
            return Err(DomainError::conflict(format!(
                "Registration '{}' is '{}', cannot check in",
                self.id, self.payment_status
            )));
        }

        if self.checked_in {
            return Err(DomainError::conflict(format!(
                "Registration '{}' is already checked in",
                self.id
            )));
        }

        self.checked_in = true;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration::new(
            RegistrationId::generate(),
            Some(TeamId::generate()),
            EventId::generate(),
            vec![ProfileId::generate(), ProfileId::generate()],
            500,
            "order-1",
        )
        .unwrap()
    }

    #[test]
    fn test_new_registration_is_initiated_with_audit_entry() {
        let reg = registration();
        assert_eq!(reg.payment_status(), PaymentStatus::Initiated);
        assert_eq!(reg.payment_attempts().len(), 1);
        assert_eq!(reg.payment_attempts()[0].order_id.as_deref(), Some("order-1"));
        assert_eq!(reg.amount_paid(), 0);
        assert!(!reg.is_checked_in());
    }

    #[test]
    fn test_empty_roster_rejected() {
        let result = Registration::new(
            RegistrationId::generate(),
            None,
            EventId::generate(),
            vec![],
            100,
            "order-1",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_pending_transition() {
        let mut reg = registration();
        reg.apply_pending().unwrap();
        assert_eq!(reg.payment_status(), PaymentStatus::Pending);
        assert_eq!(reg.payment_attempts().len(), 2);

        // pending is only reachable from initiated
        assert!(reg.apply_pending().is_err());
    }

    #[test]
    fn test_paid_transition_records_gateway_fields() {
        let mut reg = registration();
        reg.apply_paid("pay-1", "sig-1").unwrap();

        assert_eq!(reg.payment_status(), PaymentStatus::Paid);
        assert_eq!(reg.razorpay_payment_id(), Some("pay-1"));
        assert_eq!(reg.razorpay_signature(), Some("sig-1"));
        assert_eq!(reg.amount_paid(), 500);
        assert_eq!(reg.payment_attempts().len(), 2);
    }

    #[test]
    fn test_paid_twice_is_an_error_at_entity_level() {
        let mut reg = registration();
        reg.apply_paid("pay-1", "sig-1").unwrap();
        assert!(reg.apply_paid("pay-1", "sig-1").is_err());
        assert_eq!(reg.payment_attempts().len(), 2);
    }

    #[test]
    fn test_manual_verify() {
        let mut reg = registration();
        let admin = ProfileId::generate();
        reg.apply_manual(ManualVerification::new(
            admin.clone(),
            ManualAction::Verify,
            "offline payment receipt",
        ));

        assert_eq!(reg.payment_status(), PaymentStatus::ManualVerified);
        assert_eq!(reg.amount_paid(), 500);
        let record = reg.manual_verification().unwrap();
        assert_eq!(record.verified_by, admin);
        assert_eq!(record.action, ManualAction::Verify);
    }

    #[test]
    fn test_manual_reject_keeps_amount() {
        let mut reg = registration();
        reg.apply_manual(ManualVerification::new(
            ProfileId::generate(),
            ManualAction::Reject,
            "screenshot invalid",
        ));

        assert_eq!(reg.payment_status(), PaymentStatus::Failed);
        assert_eq!(reg.amount_paid(), 0);
        assert_eq!(
            reg.payment_attempts().last().unwrap().note.as_deref(),
            Some("screenshot invalid")
        );
    }

    #[test]
    fn test_check_in_requires_settled_status() {
        let mut reg = registration();
        assert!(reg.apply_check_in().is_err());

        reg.apply_paid("pay-1", "sig-1").unwrap();
        reg.apply_check_in().unwrap();
        assert!(reg.is_checked_in());

        // Second check-in conflicts
        assert!(reg.apply_check_in().is_err());
    }

    #[test]
    fn test_status_lock_semantics() {
        assert!(PaymentStatus::Paid.locks_team());
        assert!(PaymentStatus::ManualVerified.locks_team());
        assert!(!PaymentStatus::Failed.locks_team());
        assert!(!PaymentStatus::Initiated.locks_team());
    }

    #[test]
    fn test_manual_action_parsing() {
        assert_eq!("verify".parse::<ManualAction>().unwrap(), ManualAction::Verify);
        assert_eq!("reject".parse::<ManualAction>().unwrap(), ManualAction::Reject);
        assert!("approve".parse::<ManualAction>().is_err());
    }
}
