//! Response view types
//!
//! Views are explicit projections of the domain entities; the gateway
//! signature in particular never leaves the store.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::event::Event;
use crate::domain::profile::Profile;
use crate::domain::registration::{ManualVerification, PaymentAttempt, Registration};
use crate::domain::team::Team;

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub id: String,
    pub external_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_team_id: Option<String>,
    pub invitations: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ProfileView {
    pub fn from_domain(profile: &Profile) -> Self {
        Self {
            id: profile.id().as_str().to_string(),
            external_id: profile.external_id().to_string(),
            name: profile.name().to_string(),
            email: profile.email().to_string(),
            role: profile.role().to_string(),
            current_team_id: profile.current_team_id().map(|t| t.as_str().to_string()),
            invitations: profile
                .invitations()
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
            created_at: profile.created_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamView {
    pub id: String,
    pub name: String,
    pub leader_id: String,
    pub members: Vec<String>,
    pub join_requests: Vec<String>,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
}

impl TeamView {
    pub fn from_domain(team: &Team) -> Self {
        Self {
            id: team.id().as_str().to_string(),
            name: team.name().to_string(),
            leader_id: team.leader_id().as_str().to_string(),
            members: team.members().iter().map(|m| m.as_str().to_string()).collect(),
            join_requests: team
                .join_requests()
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            is_locked: team.is_locked(),
            created_at: team.created_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub id: String,
    pub name: String,
    pub entry_fee: i64,
    pub team_event: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_roster: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_roster: Option<usize>,
}

impl EventView {
    pub fn from_domain(event: &Event) -> Self {
        Self {
            id: event.id().as_str().to_string(),
            name: event.name().to_string(),
            entry_fee: event.entry_fee(),
            team_event: event.is_team_event(),
            min_roster: event.min_roster(),
            max_roster: event.max_roster(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    pub event_id: String,
    pub selected_members: Vec<String>,
    pub payment_status: String,
    pub amount_expected: i64,
    pub amount_paid: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub razorpay_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub razorpay_payment_id: Option<String>,
    pub payment_attempts: Vec<PaymentAttempt>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub manual_verifications: Vec<ManualVerification>,
    pub checked_in: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RegistrationView {
    pub fn from_domain(registration: &Registration) -> Self {
        Self {
            id: registration.id().as_str().to_string(),
            team_id: registration.team_id().map(|t| t.as_str().to_string()),
            event_id: registration.event_id().as_str().to_string(),
            selected_members: registration
                .selected_members()
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            payment_status: registration.payment_status().to_string(),
            amount_expected: registration.amount_expected(),
            amount_paid: registration.amount_paid(),
            razorpay_order_id: registration.razorpay_order_id().map(String::from),
            razorpay_payment_id: registration.razorpay_payment_id().map(String::from),
            payment_attempts: registration.payment_attempts().to_vec(),
            manual_verifications: registration.manual_verifications().to_vec(),
            checked_in: registration.is_checked_in(),
            created_at: registration.created_at(),
            updated_at: registration.updated_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::EventId;
    use crate::domain::profile::ProfileId;
    use crate::domain::registration::RegistrationId;
    use crate::domain::team::TeamId;

    #[test]
    fn test_registration_view_hides_signature() {
        let mut registration = Registration::new(
            RegistrationId::generate(),
            Some(TeamId::generate()),
            EventId::generate(),
            vec![ProfileId::generate()],
            500,
            "order_1",
        )
        .unwrap();
        registration.apply_paid("pay_1", "deadbeef").unwrap();

        let view = RegistrationView::from_domain(&registration);
        let json = serde_json::to_value(&view).unwrap();

        assert!(json.get("razorpay_signature").is_none());
        assert_eq!(json["payment_status"], "paid");
        assert_eq!(json["razorpay_payment_id"], "pay_1");
    }
}
