//! Profile domain - identity records, roles and the admin gate

pub mod authorization;
pub mod entity;
pub mod repository;
pub mod validation;

pub use authorization::{check_admin, require_admin, AccessDecision};
pub use entity::{Profile, ProfileId, UserRole};
pub use repository::ProfileRepository;
pub use validation::{
    validate_display_name, validate_email, validate_external_id, validate_profile_id,
    ProfileValidationError,
};
