//! Domain events
//!
//! Raised by the services after their writes are committed and handed to the
//! notification worker; never awaited by the request that raised them.

use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::ShopOrderStatus;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    AccountRegistered { user_id: Uuid, email: String, activation_token: String },
    OrderPlaced { order_id: Uuid, buyer_email: String, total_paid: Money, shop_order_count: usize },
    PaymentConfirmed { order_id: Uuid, shop_order_count: usize },
    ShopOrderStatusChanged { order_id: Uuid, shop_order_id: Uuid, buyer_email: String, status: ShopOrderStatus },
    NewsletterRequested { email: String, token: String },
    PasswordResetRequested { email: String, token: String },
}

impl DomainEvent {
    /// Subject suffix used when the event is published to the message bus.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AccountRegistered { .. } => "account_registered",
            Self::OrderPlaced { .. } => "order_placed",
            Self::PaymentConfirmed { .. } => "payment_confirmed",
            Self::ShopOrderStatusChanged { .. } => "shop_order_status_changed",
            Self::NewsletterRequested { .. } => "newsletter_requested",
            Self::PasswordResetRequested { .. } => "password_reset_requested",
        }
    }
}
