//! Fee payment API.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use service_core::error::AppError;

use crate::models::fees::{FeeAmount, VerifyPaymentRequest};
use crate::models::to_minor_units;
use crate::services::metrics::record_fee_order;
use crate::services::razorpay::{new_receipt, PaymentVerification};
use crate::AppState;

fn fee_error(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(json!({ "msg": msg.into() }))).into_response()
}

/// `POST /api/fees/order`
///
/// Converts the amount to paise (× 100) and creates a gateway order. The
/// gateway's order object is returned verbatim; failures are `{ msg }` with 500.
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<FeeAmount>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            record_fee_order("api", "rejected");
            return fee_error(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let amount = match to_minor_units(payload.amount) {
        Ok(amount) => amount,
        Err(e) => {
            record_fee_order("api", "rejected");
            return fee_error(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let receipt = new_receipt();
    match state.razorpay.create_order(amount, &receipt, None).await {
        Ok(order) => {
            record_fee_order("api", "created");
            (StatusCode::OK, Json(order)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, amount, "Failed to create fee order");
            record_fee_order("api", "failed");
            fee_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// `POST /api/fees/verify`
///
/// Checks the signature the checkout widget returned for a completed payment.
pub async fn verify_payment(
    State(state): State<AppState>,
    payload: Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(req) =
        payload.map_err(|rejection| AppError::BadRequest(anyhow::anyhow!(rejection.body_text())))?;

    let verified = state
        .razorpay
        .verify_payment_signature(&PaymentVerification {
            razorpay_order_id: &req.razorpay_order_id,
            razorpay_payment_id: &req.razorpay_payment_id,
            razorpay_signature: &req.razorpay_signature,
        })?;

    Ok(Json(json!({ "verified": verified })))
}
