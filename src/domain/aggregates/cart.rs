//! Cart Aggregate
//!
//! A cart is the set of [`CartLine`]s owned by one user. Line totals follow
//! the item's current price: every mutation recomputes them.

use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::catalog::Item;
use crate::domain::value_objects::{Money, MoneyError, Quantity};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CartLine {
    #[serde(skip)]
    user_id: Uuid,
    item_id: Uuid,
    quantity: Quantity,
    #[serde(rename = "price")]
    line_total: Money,
}

/// Result of taking one unit off a cart line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Subtracted {
    Decremented(CartLine),
    Removed,
}

impl CartLine {
    /// First unit of `item` in the user's cart.
    pub fn open(user_id: Uuid, item: &Item) -> Self {
        Self { user_id, item_id: item.id, quantity: Quantity::ONE, line_total: item.price }
    }

    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn item_id(&self) -> Uuid { self.item_id }
    pub fn quantity(&self) -> Quantity { self.quantity }
    pub fn line_total(&self) -> Money { self.line_total }

    /// Leaves the line untouched when the new total would overflow.
    pub fn add_one(&mut self, unit_price: Money) -> Result<(), MoneyError> {
        let quantity = self.quantity.increment();
        self.line_total = unit_price.checked_mul(quantity)?;
        self.quantity = quantity;
        Ok(())
    }

    pub fn subtract_one(mut self, unit_price: Money) -> Result<Subtracted, MoneyError> {
        match self.quantity.decrement() {
            Some(quantity) => {
                self.line_total = unit_price.checked_mul(quantity)?;
                self.quantity = quantity;
                Ok(Subtracted::Decremented(self))
            }
            None => Ok(Subtracted::Removed),
        }
    }
}

/// A cart line joined with the owning shop of its item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartEntry {
    pub line: CartLine,
    pub shop_id: Uuid,
}

#[derive(Clone, Debug, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(lines: Vec<CartLine>) -> Self { Self { lines } }
    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn total(&self) -> Result<Money, MoneyError> { Money::try_sum(self.lines.iter().map(CartLine::line_total)) }
    pub fn into_lines(self) -> Vec<CartLine> { self.lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::catalog::NewItem;
    use crate::domain::value_objects::Slug;
    use rust_decimal::Decimal;

    fn item(price: i64) -> Item {
        Item::list(Uuid::now_v7(), Slug::from_text("widget").unwrap(), NewItem {
            category_id: Uuid::now_v7(), name: "Widget".into(), image: "w.png".into(), title: "W".into(),
            description: "d".into(), price: Money::new(Decimal::from(price)),
        })
    }

    #[test]
    fn test_add_twice_then_subtract() {
        let widget = item(10);
        let mut line = CartLine::open(Uuid::now_v7(), &widget);
        let original = line.clone();
        line.add_one(widget.price).unwrap();
        assert_eq!(line.quantity().value(), 2);
        assert_eq!(line.line_total().amount(), Decimal::from(20));
        assert_eq!(line.subtract_one(widget.price).unwrap(), Subtracted::Decremented(original));
    }

    #[test]
    fn test_subtract_last_unit_removes_line() {
        let widget = item(7);
        let line = CartLine::open(Uuid::now_v7(), &widget);
        assert_eq!(line.subtract_one(widget.price).unwrap(), Subtracted::Removed);
    }

    #[test]
    fn test_line_total_follows_current_price() {
        let mut widget = item(10);
        let mut line = CartLine::open(Uuid::now_v7(), &widget);
        widget.price = Money::new(Decimal::from(12));
        line.add_one(widget.price).unwrap();
        assert_eq!(line.line_total().amount(), Decimal::from(24));
    }

    #[test]
    fn test_cart_total() {
        let (a, b) = (item(10), item(5));
        let user = Uuid::now_v7();
        let mut second = CartLine::open(user, &b);
        second.add_one(b.price).unwrap();
        let cart = Cart::new(vec![CartLine::open(user, &a), second]);
        assert_eq!(cart.total().unwrap().amount(), Decimal::from(20));
        assert!(Cart::default().is_empty());
    }

    #[test]
    fn test_overflowing_add_keeps_the_line() {
        let mut widget = item(1);
        let mut line = CartLine::open(Uuid::now_v7(), &widget);
        widget.price = Money::new(Decimal::MAX);
        assert!(matches!(line.add_one(widget.price), Err(MoneyError::Overflow)));
        assert_eq!(line.quantity(), Quantity::ONE);
        assert_eq!(line.line_total().amount(), Decimal::ONE);
    }
}
