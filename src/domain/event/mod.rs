//! Event domain

pub mod entity;
pub mod repository;

pub use entity::{Event, EventId};
pub use repository::EventRepository;
