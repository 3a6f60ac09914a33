//! In-memory registration repository

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::event::EventId;
use crate::domain::profile::ProfileId;
use crate::domain::registration::{
    ManualVerification, PaidOutcome, PaymentStatus, Registration, RegistrationId,
    RegistrationQuery, RegistrationRepository,
};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Thread-safe in-memory implementation of `RegistrationRepository`
///
/// The (team, event) uniqueness check and the insert happen under the
/// same write lock, as do the guarded status transitions; two racing
/// calls observe each other's effects.
#[derive(Debug, Default)]
pub struct InMemoryRegistrationRepository {
    registrations: RwLock<HashMap<String, Registration>>,
}

impl InMemoryRegistrationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned<T>(e: T) -> DomainError
where
    T: std::fmt::Display,
{
    DomainError::storage(format!("Failed to acquire registration lock: {}", e))
}

#[async_trait]
impl RegistrationRepository for InMemoryRegistrationRepository {
    async fn get(&self, id: &RegistrationId) -> Result<Option<Registration>, DomainError> {
        let registrations = self.registrations.read().map_err(lock_poisoned)?;
        Ok(registrations.get(id.as_str()).cloned())
    }

    async fn create(&self, registration: Registration) -> Result<Registration, DomainError> {
        let mut registrations = self.registrations.write().map_err(lock_poisoned)?;

        if registrations.contains_key(registration.id().as_str()) {
            return Err(DomainError::conflict(format!(
                "Registration '{}' already exists",
                registration.id()
            )));
        }

        match registration.team_id() {
            Some(team_id) => {
                let duplicate = registrations.values().any(|r| {
                    r.team_id() == Some(team_id) && r.event_id() == registration.event_id()
                });

                if duplicate {
                    return Err(DomainError::conflict(format!(
                        "Team '{}' is already registered for event '{}'",
                        team_id,
                        registration.event_id()
                    )));
                }
            }
            None => {
                // Individual entries: no participant may appear in two
                // rosters for the same event.
                let clash = registrations.values().any(|r| {
                    r.event_id() == registration.event_id()
                        && registration
                            .selected_members()
                            .iter()
                            .any(|m| r.includes_member(m))
                });

                if clash {
                    return Err(DomainError::conflict(format!(
                        "A selected member is already registered for event '{}'",
                        registration.event_id()
                    )));
                }
            }
        }

        registrations.insert(registration.id().as_str().to_string(), registration.clone());
        Ok(registration)
    }

    async fn find_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<Registration>, DomainError> {
        let registrations = self.registrations.read().map_err(lock_poisoned)?;
        Ok(registrations
            .values()
            .find(|r| r.razorpay_order_id() == Some(order_id))
            .cloned())
    }

    async fn mark_pending(&self, order_id: &str) -> Result<Registration, DomainError> {
        let mut registrations = self.registrations.write().map_err(lock_poisoned)?;

        let registration = registrations
            .values_mut()
            .find(|r| r.razorpay_order_id() == Some(order_id))
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "No registration for gateway order '{}'",
                    order_id
                ))
            })?;

        registration.apply_pending()?;
        Ok(registration.clone())
    }

    async fn mark_paid(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<PaidOutcome, DomainError> {
        let mut registrations = self.registrations.write().map_err(lock_poisoned)?;

        let registration = registrations
            .values_mut()
            .find(|r| r.razorpay_order_id() == Some(order_id))
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "No registration for gateway order '{}'",
                    order_id
                ))
            })?;

        if registration.payment_status() == PaymentStatus::Paid {
            return Ok(PaidOutcome::AlreadyPaid(registration.clone()));
        }

        registration.apply_paid(payment_id, signature)?;
        Ok(PaidOutcome::Transitioned(registration.clone()))
    }

    async fn apply_manual_verification(
        &self,
        id: &RegistrationId,
        verification: ManualVerification,
    ) -> Result<Registration, DomainError> {
        let mut registrations = self.registrations.write().map_err(lock_poisoned)?;

        let registration = registrations
            .get_mut(id.as_str())
            .ok_or_else(|| DomainError::not_found(format!("Registration '{}' not found", id)))?;

        registration.apply_manual(verification);
        Ok(registration.clone())
    }

    async fn check_in(&self, id: &RegistrationId) -> Result<Registration, DomainError> {
        let mut registrations = self.registrations.write().map_err(lock_poisoned)?;

        let registration = registrations
            .get_mut(id.as_str())
            .ok_or_else(|| DomainError::not_found(format!("Registration '{}' not found", id)))?;

        registration.apply_check_in()?;
        Ok(registration.clone())
    }

    async fn list_for_teams(
        &self,
        team_ids: &[TeamId],
    ) -> Result<Vec<Registration>, DomainError> {
        let registrations = self.registrations.read().map_err(lock_poisoned)?;
        Ok(registrations
            .values()
            .filter(|r| r.team_id().is_some_and(|t| team_ids.contains(t)))
            .cloned()
            .collect())
    }

    async fn list_for_member(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<Registration>, DomainError> {
        let registrations = self.registrations.read().map_err(lock_poisoned)?;
        Ok(registrations
            .values()
            .filter(|r| r.includes_member(profile_id))
            .cloned()
            .collect())
    }

    async fn list(&self, query: &RegistrationQuery) -> Result<Vec<Registration>, DomainError> {
        let registrations = self.registrations.read().map_err(lock_poisoned)?;

        let mut result: Vec<Registration> = registrations
            .values()
            .filter(|r| {
                query
                    .event_id
                    .as_ref()
                    .is_none_or(|event_id| r.event_id() == event_id)
            })
            .filter(|r| {
                query
                    .status
                    .is_none_or(|status| r.payment_status() == status)
            })
            .cloned()
            .collect();

        result.sort_by(|a, b| a.created_at().cmp(&b.created_at()));
        Ok(result)
    }
}
