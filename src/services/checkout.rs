//! Checkout orchestrator
//!
//! cart -> payment intent -> order + lines + one shop order per shop -> cart cleared.
//! The payment call finishes before anything is written; the writes are a
//! single [`Store::place_order`] unit.

use std::time::Duration;

use crate::domain::aggregates::{CheckoutDraft, PlacedOrder, ShippingDetails, User};
use crate::domain::events::DomainEvent;
use crate::notify::Notifier;
use crate::payment::{PaymentError, PaymentGateway, PaymentRequest};
use crate::store::Store;
use crate::Result;

#[derive(Clone, Debug)]
pub struct PaymentSettings {
    pub currency: String,
    pub timeout: Duration,
}

pub async fn place_order(
    store: &dyn Store,
    payments: &dyn PaymentGateway,
    notifier: &Notifier,
    settings: &PaymentSettings,
    buyer: &User,
    shipping: ShippingDetails,
) -> Result<PlacedOrder> {
    let draft = CheckoutDraft::from_cart(store.cart_entries(buyer.id).await?)?;

    let request = PaymentRequest {
        amount: draft.total().to_minor_units()?,
        currency: settings.currency.clone(),
        buyer_id: buyer.id,
    };
    let intent = match tokio::time::timeout(settings.timeout, payments.create_intent(&request)).await {
        Ok(Ok(intent)) => intent,
        Ok(Err(e)) => {
            tracing::warn!(buyer_id = %buyer.id, amount = request.amount, error = %e, "Payment authorization failed");
            return Err(e.into());
        }
        Err(_) => {
            tracing::warn!(buyer_id = %buyer.id, amount = request.amount, "Payment authorization timed out");
            return Err(PaymentError::Timeout.into());
        }
    };

    let consumed = draft.cart_lines();
    let placed = draft.place(buyer.id, shipping, intent.id);
    store.place_order(&placed, &consumed).await?;

    tracing::info!(
        order_id = %placed.order.id,
        buyer_id = %buyer.id,
        total_paid = %placed.order.total_paid,
        shop_orders = placed.shop_orders.len(),
        "Order placed"
    );
    notifier.send(DomainEvent::OrderPlaced {
        order_id: placed.order.id,
        buyer_email: buyer.email.clone(),
        total_paid: placed.order.total_paid,
        shop_order_count: placed.shop_orders.len(),
    });
    Ok(placed)
}
