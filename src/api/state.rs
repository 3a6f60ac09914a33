//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::event::EventService;
use crate::infrastructure::identity::IdentityService;
use crate::infrastructure::payment::PaymentService;
use crate::infrastructure::registration::RegistrationService;
use crate::infrastructure::team::TeamService;

/// Application state containing shared service handles
#[derive(Clone)]
pub struct AppState {
    pub identity_service: Arc<IdentityService>,
    pub team_service: Arc<TeamService>,
    pub event_service: Arc<EventService>,
    pub registration_service: Arc<RegistrationService>,
    pub payment_service: Arc<PaymentService>,
}
