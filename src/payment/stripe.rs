//! Stripe integration via REST API (no SDK dependency)

use std::time::Duration;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{PaymentError, PaymentGateway, PaymentIntent, PaymentRequest};

const STRIPE_API: &str = "https://api.stripe.com";

/// Webhook events older than this are rejected.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>, timeout: Duration) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PaymentError::Unavailable(e.to_string()))?;
        Ok(Self { client, secret_key: secret_key.into(), api_base: STRIPE_API.to_string() })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, request: &PaymentRequest) -> Result<PaymentIntent, PaymentError> {
        let amount = request.amount.to_string();
        let buyer_id = request.buyer_id.to_string();
        let response = self.client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("amount", amount.as_str()),
                ("currency", request.currency.as_str()),
                ("metadata[user_id]", buyer_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| if e.is_timeout() { PaymentError::Timeout } else { PaymentError::Unavailable(e.to_string()) })?;

        let status = response.status();
        let body: serde_json::Value = response.json().await
            .map_err(|e| PaymentError::Unavailable(e.to_string()))?;

        if !status.is_success() {
            let message = body["error"]["message"].as_str().unwrap_or("Payment was declined");
            return Err(PaymentError::Declined(message.to_string()));
        }

        body["id"]
            .as_str()
            .map(|id| PaymentIntent { id: id.to_string() })
            .ok_or_else(|| PaymentError::Unavailable(format!("Stripe create_intent failed: {body}")))
    }
}

/// Verify a `Stripe-Signature` header (HMAC-SHA256 over `"{t}.{payload}"`).
pub fn verify_signature(payload: &[u8], header: &str, secret: &str, now: i64) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }
    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&expected).map_err(|_| "Webhook signature mismatch")?;

    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err("Webhook timestamp too old");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    #[test]
    fn test_valid_signature() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let header = sign(payload, SECRET, 1_700_000_000);
        assert!(verify_signature(payload, &header, SECRET, 1_700_000_010).is_ok());
    }

    #[test]
    fn test_tampered_payload() {
        let header = sign(b"original", SECRET, 1_700_000_000);
        assert_eq!(verify_signature(b"tampered", &header, SECRET, 1_700_000_000), Err("Webhook signature mismatch"));
    }

    #[test]
    fn test_stale_timestamp() {
        let header = sign(b"x", SECRET, 1_700_000_000);
        assert_eq!(verify_signature(b"x", &header, SECRET, 1_700_000_000 + 301), Err("Webhook timestamp too old"));
    }

    #[test]
    fn test_malformed_header() {
        assert!(verify_signature(b"x", "garbage", SECRET, 0).is_err());
    }
}
