//! Registration infrastructure implementations

mod in_memory;
mod postgres_repository;
mod service;

pub use in_memory::InMemoryRegistrationRepository;
pub use postgres_repository::PostgresRegistrationRepository;
pub use service::{CreateRegistrationRequest, RegistrationService};
