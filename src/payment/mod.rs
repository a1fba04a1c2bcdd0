//! Payment collaborator
//!
//! Checkout asks a [`PaymentGateway`] for a payment intent before it writes
//! anything. Confirmation arrives later as a [`PaymentEvent`] on the webhook.

pub mod stripe;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use stripe::StripeGateway;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Amount in minor units (cents).
    pub amount: i64,
    pub currency: String,
    pub buyer_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
}

#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Declined(String),
    #[error("Payment provider unavailable: {0}")]
    Unavailable(String),
    #[error("Payment provider did not answer in time")]
    Timeout,
    #[error("Invalid payment event: {0}")]
    InvalidEvent(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: &PaymentRequest) -> Result<PaymentIntent, PaymentError>;
}

/// Gateway used when no provider key is configured: every intent is approved.
#[derive(Debug, Default, Clone)]
pub struct LocalGateway;

#[async_trait]
impl PaymentGateway for LocalGateway {
    async fn create_intent(&self, request: &PaymentRequest) -> Result<PaymentIntent, PaymentError> {
        tracing::debug!(amount = request.amount, buyer_id = %request.buyer_id, "Approving payment locally");
        Ok(PaymentIntent { id: format!("pi_local_{}", Uuid::new_v4().simple()) })
    }
}

/// Events delivered by the payment provider's webhook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentEvent {
    Succeeded { reference: String, buyer_id: Option<String> },
    Other(String),
}

impl PaymentEvent {
    pub fn parse(body: &[u8]) -> Result<Self, PaymentError> {
        let event: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| PaymentError::InvalidEvent(e.to_string()))?;
        let event_type = event["type"].as_str()
            .ok_or_else(|| PaymentError::InvalidEvent("missing event type".into()))?;
        if event_type != "payment_intent.succeeded" {
            return Ok(Self::Other(event_type.to_string()));
        }
        let intent = &event["data"]["object"];
        let reference = intent["id"].as_str()
            .ok_or_else(|| PaymentError::InvalidEvent("missing payment intent id".into()))?;
        let buyer_id = intent["metadata"]["user_id"].as_str().map(String::from);
        Ok(Self::Succeeded { reference: reference.to_string(), buyer_id })
    }
}
