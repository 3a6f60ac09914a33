//! API middleware and extractors

mod auth;

pub use auth::{extract_external_id, RequireUser, EXTERNAL_ID_HEADER};
