//! Order Aggregate
//!
//! An [`Order`] is created from a buyer's cart in one step together with its
//! [`OrderLine`]s and one [`ShopOrder`] per shop represented in the cart.

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::cart::{CartEntry, CartLine};
use crate::domain::aggregates::shop_order::ShopOrder;
use crate::domain::value_objects::{Money, MoneyError, Quantity};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShippingDetails {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
    pub country: String,
    pub city: String,
    pub pin_code: String,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    #[serde(skip)]
    pub buyer_id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub shipping: ShippingDetails,
    pub total_paid: Money,
    pub billing_status: bool,
    #[serde(skip)]
    pub payment_reference: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub shop_id: Uuid,
    pub quantity: Quantity,
    pub unit_price: Money,
    #[serde(rename = "price")]
    pub line_total: Money,
}

/// Totals computed from a cart before payment is requested.
#[derive(Clone, Debug)]
pub struct CheckoutDraft {
    entries: Vec<CartEntry>,
    total: Money,
    per_shop: BTreeMap<Uuid, Money>,
}

/// Everything a successful checkout writes, committed as one unit.
#[derive(Clone, Debug)]
pub struct PlacedOrder {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub shop_orders: Vec<ShopOrder>,
}

impl CheckoutDraft {
    pub fn from_cart(entries: Vec<CartEntry>) -> Result<Self, OrderError> {
        if entries.is_empty() { return Err(OrderError::EmptyCart); }
        let mut per_shop: BTreeMap<Uuid, Money> = BTreeMap::new();
        for entry in &entries {
            let subtotal = per_shop.entry(entry.shop_id).or_insert(Money::ZERO);
            *subtotal = subtotal.checked_add(entry.line.line_total())?;
        }
        let total = Money::try_sum(entries.iter().map(|e| e.line.line_total()))?;
        Ok(Self { entries, total, per_shop })
    }

    pub fn total(&self) -> Money { self.total }
    pub fn shop_count(&self) -> usize { self.per_shop.len() }

    /// The cart lines this draft was computed from.
    pub fn cart_lines(&self) -> Vec<CartLine> { self.entries.iter().map(|e| e.line.clone()).collect() }

    /// Builds the order rows. Billing starts unconfirmed; only the payment callback flips it.
    pub fn place(self, buyer_id: Uuid, shipping: ShippingDetails, payment_reference: impl Into<String>) -> PlacedOrder {
        let now = Utc::now();
        let order = Order {
            id: Uuid::now_v7(), buyer_id, shipping, total_paid: self.total, billing_status: false,
            payment_reference: payment_reference.into(), created_at: now,
        };
        let lines = self.entries.iter().map(|entry| {
            let quantity = entry.line.quantity();
            let line_total = entry.line.line_total();
            OrderLine {
                id: Uuid::now_v7(), order_id: order.id, item_id: entry.line.item_id(), shop_id: entry.shop_id,
                quantity, unit_price: Money::new(line_total.amount() / Decimal::from(quantity.value())), line_total,
            }
        }).collect();
        let shop_orders = self.per_shop.iter()
            .map(|(shop_id, subtotal)| ShopOrder::open(*shop_id, order.id, buyer_id, *subtotal, order.billing_status, now))
            .collect();
        PlacedOrder { order, lines, shop_orders }
    }
}

impl PlacedOrder {
    /// Shop order totals add up to the order total.
    pub fn is_balanced(&self) -> bool {
        Money::try_sum(self.shop_orders.iter().map(|so| so.total_paid)).is_ok_and(|sum| sum == self.order.total_paid)
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderError {
    #[error("Cart is empty.")]
    EmptyCart,
    #[error(transparent)]
    Amount(#[from] MoneyError),
}
