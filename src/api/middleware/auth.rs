//! Authentication extractor
//!
//! Session verification happens upstream; requests arrive carrying the
//! verified external identity in the `X-External-Id` header. This
//! extractor resolves it to a profile and rejects with 401 when the
//! header is missing or unknown.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::profile::Profile;

pub const EXTERNAL_ID_HEADER: &str = "x-external-id";

/// Extractor that requires a resolved profile
#[derive(Debug, Clone)]
pub struct RequireUser(pub Profile);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let external_id = extract_external_id(&parts.headers)?;

        debug!(external_id = %external_id, "Resolving identity");

        let profile = state
            .identity_service
            .resolve(&external_id)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::unauthorized("Unknown identity"))?;

        Ok(RequireUser(profile))
    }
}

/// Pull the verified external identity off the request headers
pub fn extract_external_id(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers.get(EXTERNAL_ID_HEADER).ok_or_else(|| {
        ApiError::unauthorized("Authentication required. Provide the 'X-External-Id' header")
    })?;

    let external_id = value
        .to_str()
        .map_err(|_| ApiError::bad_request("Invalid X-External-Id header encoding"))?
        .trim();

    if external_id.is_empty() {
        return Err(ApiError::unauthorized("Empty external identity"));
    }

    Ok(external_id.to_string())
}
