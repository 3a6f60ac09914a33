//! API request/response types

mod error;
mod views;

pub use error::{ApiError, ApiErrorDetail, ApiErrorResponse, ApiErrorType};
pub use views::{EventView, ProfileView, RegistrationView, TeamView};
