//! Profile infrastructure implementations

mod in_memory;
mod postgres_repository;

pub use in_memory::InMemoryProfileRepository;
pub use postgres_repository::PostgresProfileRepository;
