//! Razorpay client for fee collection.
//!
//! Creates orders through the Orders API and verifies the checkout signature
//! the widget hands back once the payer completes.

use crate::config::RazorpaySettings;
use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    settings: RazorpaySettings,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    /// Amount in the smallest currency unit (paise for INR).
    amount: u64,
    currency: &'a str,
    receipt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<serde_json::Value>,
}

/// Order as returned by Razorpay; passed through to the browser unchanged.
///
/// Only the fields the portal reads are typed. Everything else the gateway
/// sends (`entity`, `status`, `offer_id`, ...) is kept in `fields` and
/// serialized back as received.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RazorpayError {
    error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetail {
    code: String,
    description: String,
}

/// Fields the checkout widget returns after a successful payment.
#[derive(Debug)]
pub struct PaymentVerification<'a> {
    pub razorpay_order_id: &'a str,
    pub razorpay_payment_id: &'a str,
    pub razorpay_signature: &'a str,
}

impl RazorpayClient {
    pub fn new(client: Client, settings: RazorpaySettings) -> Self {
        Self { client, settings }
    }

    /// Check if Razorpay is configured (credentials are set).
    pub fn is_configured(&self) -> bool {
        !self.settings.key_id.is_empty() && !self.settings.key_secret.expose_secret().is_empty()
    }

    /// Public key id, handed to the checkout widget.
    pub fn key_id(&self) -> &str {
        &self.settings.key_id
    }

    pub fn currency(&self) -> &str {
        &self.settings.currency
    }

    /// Create an order for `amount` minor units in the configured currency.
    ///
    /// On failure the error carries Razorpay's own description.
    pub async fn create_order(
        &self,
        amount: u64,
        receipt: &str,
        notes: Option<serde_json::Value>,
    ) -> Result<RazorpayOrder> {
        if !self.is_configured() {
            return Err(anyhow!("Razorpay credentials not configured"));
        }

        let request = CreateOrderRequest {
            amount,
            currency: &self.settings.currency,
            receipt,
            notes,
        };

        let url = format!("{}/orders", self.settings.api_base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .basic_auth(
                &self.settings.key_id,
                Some(self.settings.key_secret.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, "Razorpay create_order response");

        if status.is_success() {
            let order: RazorpayOrder = serde_json::from_str(&body)?;
            tracing::info!(
                order_id = %order.id,
                amount = order.amount,
                currency = %order.currency,
                receipt = %receipt,
                "Razorpay order created"
            );
            Ok(order)
        } else {
            let description = match serde_json::from_str::<RazorpayError>(&body) {
                Ok(error) => {
                    tracing::error!(
                        code = %error.error.code,
                        description = %error.error.description,
                        "Razorpay order creation failed"
                    );
                    error.error.description
                }
                Err(_) => {
                    tracing::error!(status = %status, body = %body, "Razorpay order creation failed");
                    format!("Razorpay returned {}", status)
                }
            };
            Err(anyhow!(description))
        }
    }

    /// Verify payment signature from Razorpay checkout.
    ///
    /// The signature is `HMAC-SHA256(order_id + "|" + payment_id, key_secret)`, hex encoded.
    pub fn verify_payment_signature(&self, verification: &PaymentVerification<'_>) -> Result<bool> {
        let payload = format!(
            "{}|{}",
            verification.razorpay_order_id, verification.razorpay_payment_id
        );

        let expected = compute_signature(&payload, self.settings.key_secret.expose_secret())?;
        let is_valid: bool = expected
            .as_bytes()
            .ct_eq(verification.razorpay_signature.as_bytes())
            .into();

        if is_valid {
            tracing::info!(
                order_id = %verification.razorpay_order_id,
                payment_id = %verification.razorpay_payment_id,
                "Payment signature verified"
            );
        } else {
            tracing::warn!(
                order_id = %verification.razorpay_order_id,
                payment_id = %verification.razorpay_payment_id,
                "Payment signature verification failed"
            );
        }

        Ok(is_valid)
    }
}

pub(crate) fn compute_signature(payload: &str, secret: &str) -> Result<String> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| anyhow!("Invalid key length"))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Receipt id for a new order: `receipt_` plus a simple UUID, 40 characters,
/// which is Razorpay's maximum receipt length.
pub fn new_receipt() -> String {
    format!("receipt_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn settings(key_id: &str, key_secret: &str) -> RazorpaySettings {
        RazorpaySettings {
            key_id: key_id.to_string(),
            key_secret: Secret::new(key_secret.to_string()),
            api_base_url: "https://api.razorpay.com/v1".to_string(),
            currency: "INR".to_string(),
        }
    }

    #[test]
    fn test_is_configured() {
        assert!(RazorpayClient::new(Client::new(), settings("rzp_test_123", "s")).is_configured());
        assert!(!RazorpayClient::new(Client::new(), settings("", "")).is_configured());
    }

    #[test]
    fn test_payment_signature_verification() {
        let client = RazorpayClient::new(Client::new(), settings("rzp_test_123", "my_secret_key"));
        let expected = compute_signature("order_123|pay_456", "my_secret_key").unwrap();

        let verification = PaymentVerification {
            razorpay_order_id: "order_123",
            razorpay_payment_id: "pay_456",
            razorpay_signature: &expected,
        };

        assert!(client.verify_payment_signature(&verification).unwrap());
    }

    #[test]
    fn test_invalid_signature() {
        let client = RazorpayClient::new(Client::new(), settings("rzp_test_123", "test_secret"));

        let verification = PaymentVerification {
            razorpay_order_id: "order_123",
            razorpay_payment_id: "pay_456",
            razorpay_signature: "invalid_signature",
        };

        assert!(!client.verify_payment_signature(&verification).unwrap());
    }

    #[test]
    fn receipt_fits_gateway_limit() {
        let receipt = new_receipt();
        assert!(receipt.starts_with("receipt_"));
        assert_eq!(receipt.len(), 40);
    }

    #[test]
    fn order_keeps_untyped_gateway_fields() {
        let body = serde_json::json!({
            "id": "order_Nx1",
            "entity": "order",
            "amount": 50000,
            "amount_paid": 0,
            "amount_due": 50000,
            "currency": "INR",
            "receipt": "receipt_1",
            "offer_id": null,
            "status": "created",
            "attempts": 0,
            "notes": [],
            "created_at": 1717232400u64
        });

        let order: RazorpayOrder = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(order.id, "order_Nx1");
        assert_eq!(order.amount, 50000);
        assert_eq!(serde_json::to_value(&order).unwrap(), body);
    }

    #[tokio::test]
    async fn unconfigured_client_refuses_orders() {
        let client = RazorpayClient::new(Client::new(), settings("", ""));
        let err = client.create_order(100, "receipt_x", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Razorpay credentials not configured");
    }
}
