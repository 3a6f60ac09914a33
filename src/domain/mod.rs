//! Domain layer - entities, invariants and repository contracts

pub mod error;
pub mod event;
pub mod profile;
pub mod registration;
pub mod team;

pub use error::DomainError;
pub use event::{Event, EventId, EventRepository};
pub use profile::{
    check_admin, require_admin, AccessDecision, Profile, ProfileId, ProfileRepository, UserRole,
};
pub use registration::{
    ManualAction, ManualVerification, PaidOutcome, PaymentAttempt, PaymentStatus, Registration,
    RegistrationId, RegistrationQuery, RegistrationRepository,
};
pub use team::{Team, TeamId, TeamRepository};
