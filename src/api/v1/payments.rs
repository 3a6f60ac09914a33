//! Payment callback handlers
//!
//! The gateway callback carries its own proof (the signature); no
//! session identity is required on this path.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, RegistrationView};

#[derive(Debug, Deserialize)]
pub struct GatewayCallbackBody {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkPendingBody {
    pub razorpay_order_id: String,
}

/// POST /v1/payments/callback - gateway or client payment confirmation
pub async fn gateway_callback(
    State(state): State<AppState>,
    Json(body): Json<GatewayCallbackBody>,
) -> Result<Json<RegistrationView>, ApiError> {
    info!(order = %body.razorpay_order_id, "Payment callback received");

    let registration = state
        .payment_service
        .verify_gateway_callback(
            &body.razorpay_order_id,
            &body.razorpay_payment_id,
            &body.razorpay_signature,
        )
        .await?;

    Ok(Json(RegistrationView::from_domain(&registration)))
}

/// POST /v1/payments/pending - the gateway order was handed to the client
pub async fn mark_pending(
    State(state): State<AppState>,
    Json(body): Json<MarkPendingBody>,
) -> Result<Json<RegistrationView>, ApiError> {
    let registration = state
        .registration_service
        .mark_pending(&body.razorpay_order_id)
        .await?;

    Ok(Json(RegistrationView::from_domain(&registration)))
}
