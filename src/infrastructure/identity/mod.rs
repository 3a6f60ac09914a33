//! Identity resolution infrastructure

mod service;

pub use service::IdentityService;
