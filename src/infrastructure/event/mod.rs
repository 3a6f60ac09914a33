//! Event infrastructure implementations

mod in_memory;
mod postgres_repository;
mod service;

pub use in_memory::InMemoryEventRepository;
pub use postgres_repository::PostgresEventRepository;
pub use service::{CreateEventRequest, EventService};
