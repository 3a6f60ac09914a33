//! Payment verification infrastructure

mod service;

pub use service::PaymentService;
