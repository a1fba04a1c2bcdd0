//! Order and shop-order queries, status changes and payment confirmation

use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderLine, ShopOrder, ShopOrderStatus};
use crate::domain::events::DomainEvent;
use crate::domain::patch::FieldDiff;
use crate::notify::Notifier;
use crate::store::Store;
use crate::{AppError, Result};

const NO_ORDERS: &str = "You have no orders yet.";

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
}

/// Order ids arrive as path text; anything that is not a UUID cannot name an order.
pub fn parse_order_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found("Order"))
}

pub async fn list_orders(store: &dyn Store, buyer_id: Uuid) -> Result<Vec<Order>> {
    let orders = store.orders_for_buyer(buyer_id).await?;
    if orders.is_empty() {
        return Err(AppError::conflict(NO_ORDERS));
    }
    Ok(orders)
}

pub async fn get_order(store: &dyn Store, buyer_id: Uuid, order_id: Uuid) -> Result<OrderDetail> {
    let order = store.order_for_buyer(buyer_id, order_id).await?.ok_or_else(|| AppError::not_found("Order"))?;
    let items = store.order_lines(order.id).await?;
    Ok(OrderDetail { order, items })
}

pub async fn list_shop_orders(store: &dyn Store, shop_id: Uuid) -> Result<Vec<ShopOrder>> {
    let orders = store.shop_orders_for_shop(shop_id).await?;
    if orders.is_empty() {
        return Err(AppError::conflict(NO_ORDERS));
    }
    Ok(orders)
}

pub async fn get_shop_order(store: &dyn Store, shop_id: Uuid, shop_order_id: Uuid) -> Result<ShopOrder> {
    store.shop_order(shop_id, shop_order_id).await?.ok_or_else(|| AppError::not_found("Order"))
}

/// Moves a shop order to `status` and tells the buyer. Setting the current status again is rejected.
pub async fn update_shop_order_status(
    store: &dyn Store,
    notifier: &Notifier,
    shop_id: Uuid,
    shop_order_id: Uuid,
    status: ShopOrderStatus,
) -> Result<ShopOrder> {
    let mut shop_order = get_shop_order(store, shop_id, shop_order_id).await?;
    let mut diff = FieldDiff::new();
    diff.apply(&mut shop_order.status, Some(status));
    diff.finish()?;

    store.set_shop_order_status(shop_order.id, shop_order.status).await?;
    tracing::info!(shop_order_id = %shop_order.id, %shop_id, status = status.as_str(), "Shop order status changed");

    match store.user_by_id(shop_order.buyer_id).await? {
        Some(buyer) => notifier.send(DomainEvent::ShopOrderStatusChanged {
            order_id: shop_order.order_id,
            shop_order_id: shop_order.id,
            buyer_email: buyer.email,
            status,
        }),
        None => tracing::debug!(buyer_id = %shop_order.buyer_id, "Buyer account is gone, no status notification"),
    }
    Ok(shop_order)
}

/// Payment callback: marks the order and every shop order under it as paid.
pub async fn confirm_payment(store: &dyn Store, notifier: &Notifier, reference: &str) -> Result<Order> {
    let Some(mut order) = store.order_by_payment_reference(reference).await? else {
        tracing::warn!(reference, "Payment confirmed for unknown order");
        return Err(AppError::not_found("Order"));
    };
    let shop_order_count = store.confirm_payment(order.id).await?;
    order.billing_status = true;
    tracing::info!(order_id = %order.id, reference, shop_order_count, "Payment confirmed");
    notifier.send(DomainEvent::PaymentConfirmed { order_id: order.id, shop_order_count });
    Ok(order)
}
