//! Team domain - membership, join requests and the lock state

pub mod entity;
pub mod repository;
pub mod validation;

pub use entity::{Team, TeamId};
pub use repository::TeamRepository;
pub use validation::{validate_team_id, validate_team_name, TeamValidationError};
