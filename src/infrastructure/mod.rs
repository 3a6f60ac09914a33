//! Infrastructure layer - repository implementations and services

pub mod event;
pub mod identity;
pub mod logging;
pub mod payment;
pub mod profile;
pub mod registration;
pub mod storage;
pub mod team;
