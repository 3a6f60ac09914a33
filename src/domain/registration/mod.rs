//! Registration domain - the per-(team, event) ledger and payment lifecycle

pub mod entity;
pub mod repository;

pub use entity::{
    ManualAction, ManualVerification, PaymentAttempt, PaymentStatus, Registration, RegistrationId,
};
pub use repository::{PaidOutcome, RegistrationQuery, RegistrationRepository};
