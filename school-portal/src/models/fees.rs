use serde::Deserialize;
use thiserror::Error;

/// Body of `POST /api/fees/order`.
#[derive(Debug, Deserialize)]
pub struct FeeAmount {
    /// Amount in major currency units (rupees).
    pub amount: f64,
}

/// Checkout callback fields posted back after the gateway widget completes.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum AmountError {
    #[error("Amount must be a finite number")]
    NotFinite,
    #[error("Amount must be greater than zero")]
    NotPositive,
    #[error("Amount is too large")]
    TooLarge,
}

/// Convert a major-unit amount to minor units (× 100), rounding to the nearest paisa.
pub fn to_minor_units(amount: f64) -> Result<u64, AmountError> {
    if !amount.is_finite() {
        return Err(AmountError::NotFinite);
    }

    let minor = (amount * 100.0).round();
    if minor < 1.0 {
        return Err(AmountError::NotPositive);
    }
    // f64 represents integers exactly only up to 2^53.
    if minor > 9_007_199_254_740_992.0 {
        return Err(AmountError::TooLarge);
    }

    Ok(minor as u64)
}
