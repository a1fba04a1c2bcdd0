//! Cart ledger

use serde::Serialize;
use uuid::Uuid;

use super::item_by_path;
use crate::domain::aggregates::{Cart, CartLine, Subtracted};
use crate::domain::value_objects::Money;
use crate::store::Store;
use crate::{AppError, Result};

#[derive(Debug, Serialize)]
pub struct CartView {
    pub total_amount: Money,
    pub cart_items: Vec<CartLine>,
}

impl TryFrom<Cart> for CartView {
    type Error = AppError;

    fn try_from(cart: Cart) -> Result<Self> {
        Ok(Self { total_amount: cart.total()?, cart_items: cart.into_lines() })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubtractOutcome {
    Decremented(CartLine),
    Removed,
    AlreadyRemoved,
}

/// Adds one unit of the item, re-pricing the line at the item's current price.
pub async fn add_to_cart(store: &dyn Store, user_id: Uuid, item_slug: &str) -> Result<CartLine> {
    let item = item_by_path(store, item_slug).await?;
    if !item.is_purchasable() {
        return Err(AppError::not_found("Item"));
    }
    let line = store.add_cart_unit(user_id, &item).await?;
    tracing::debug!(%user_id, item_id = %item.id, quantity = line.quantity().value(), "Cart line updated");
    Ok(line)
}

pub async fn subtract_from_cart(store: &dyn Store, user_id: Uuid, item_slug: &str) -> Result<SubtractOutcome> {
    let item = item_by_path(store, item_slug).await?;
    let Some(line) = store.cart_line(user_id, item.id).await? else {
        return Ok(SubtractOutcome::AlreadyRemoved);
    };
    match line.subtract_one(item.price)? {
        Subtracted::Decremented(line) => {
            store.save_cart_line(&line).await?;
            Ok(SubtractOutcome::Decremented(line))
        }
        Subtracted::Removed => {
            store.delete_cart_line(user_id, item.id).await?;
            Ok(SubtractOutcome::Removed)
        }
    }
}

pub async fn list_cart(store: &dyn Store, user_id: Uuid) -> Result<Cart> {
    let entries = store.cart_entries(user_id).await?;
    Ok(Cart::new(entries.into_iter().map(|e| e.line).collect()))
}
