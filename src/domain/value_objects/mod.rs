//! Value Objects for the marketplace

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// URL-safe identifier for shops, categories and items
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Slug(String);

impl Slug {
    /// Lowercases the input and collapses every run of non-alphanumeric characters into one dash.
    pub fn from_text(text: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(text.len());
        let mut pending_dash = false;
        for c in text.trim().chars() {
            if c.is_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.extend(c.to_lowercase());
            } else {
                pending_dash = true;
            }
        }
        if slug.is_empty() { return Err(SlugError::Empty); }
        Ok(Self(slug))
    }

    /// Slug for an entity owned by a shop, e.g. `acme-blue-mug`.
    pub fn scoped(shop_name: &str, name: &str) -> Result<Self, SlugError> {
        Self::from_text(&format!("{shop_name} {name}"))
    }

    /// `n`-th uniqueness candidate: the slug itself for 0, then `slug-1`, `slug-2`, ...
    pub fn with_suffix(&self, n: u32) -> Slug {
        if n == 0 { self.clone() } else { Slug(format!("{}-{}", self.0, n)) }
    }

    /// Accepts an identifier taken from a URL as-is; `None` if it could not be a slug.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty() && raw.chars().all(|c| c == '-' || (c.is_alphanumeric() && !c.is_uppercase()));
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, Error)]
pub enum SlugError {
    #[error("Name must contain at least one letter or digit.")]
    Empty,
}

/// Money value object. Amounts are in major units of the marketplace currency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    /// Digits after the decimal point a price may carry.
    pub const PRICE_SCALE: u32 = 2;

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_negative(&self) -> bool { self.0.is_sign_negative() && !self.0.is_zero() }

    /// Largest price an item may be listed at (`NUMERIC(12, 2)`).
    pub fn max_price() -> Money { Money(Decimal::new(999_999_999_999, 2)) }

    /// True when the amount needs more than [`Money::PRICE_SCALE`] decimal places.
    pub fn exceeds_price_scale(&self) -> bool { self.0.normalize().scale() > Self::PRICE_SCALE }

    pub fn checked_add(&self, other: Money) -> Result<Money, MoneyError> {
        self.0.checked_add(other.0).map(Money).ok_or(MoneyError::Overflow)
    }

    pub fn checked_mul(&self, qty: Quantity) -> Result<Money, MoneyError> {
        self.0.checked_mul(Decimal::from(qty.value())).map(Money).ok_or(MoneyError::Overflow)
    }

    pub fn try_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Result<Money, MoneyError> {
        amounts.into_iter().try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }

    /// Integer amount in minor units (cents), rounded half away from zero.
    pub fn to_minor_units(&self) -> Result<i64, MoneyError> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::Overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(MoneyError::Overflow)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.0) }
}

#[derive(Debug, Clone, Error)]
pub enum MoneyError {
    #[error("Amount is out of range.")]
    Overflow,
}

/// Quantity of one item on a cart or order line. Always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Quantity(i32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: i32) -> Option<Self> { (value >= 1).then_some(Self(value)) }
    pub fn value(&self) -> i32 { self.0 }
    pub fn increment(&self) -> Self { Self(self.0.saturating_add(1)) }
    /// `None` when the quantity would drop below one.
    pub fn decrement(&self) -> Option<Self> { Self::new(self.0 - 1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        let slug = Slug::from_text("  Blue Mug!! (XL) ").unwrap();
        assert_eq!(slug.as_str(), "blue-mug-xl");
        assert!(Slug::from_text("!!!").is_err());
    }

    #[test]
    fn test_scoped_slug() {
        assert_eq!(Slug::scoped("Acme Store", "Blue Mug").unwrap().as_str(), "acme-store-blue-mug");
    }

    #[test]
    fn test_slug_suffix_candidates() {
        let base = Slug::from_text("Acme").unwrap();
        assert_eq!(base.with_suffix(0), base);
        assert_eq!(base.with_suffix(3).as_str(), "acme-3");
    }

    #[test]
    fn test_parse_path_slug() {
        assert_eq!(Slug::parse("acme-blue-mug").unwrap().as_str(), "acme-blue-mug");
        assert!(Slug::parse("Acme").is_none());
        assert!(Slug::parse("a/b").is_none());
        assert!(Slug::parse("").is_none());
    }

    #[test]
    fn test_money_arithmetic() {
        let price = Money::new(Decimal::new(1050, 2));
        let qty = Quantity::new(3).unwrap();
        assert_eq!(price.checked_mul(qty).unwrap().amount(), Decimal::new(3150, 2));
        assert_eq!(Money::try_sum([price, price]).unwrap().amount(), Decimal::new(2100, 2));
        assert_eq!(Money::try_sum(std::iter::empty()).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_money_overflow_is_an_error() {
        let huge = Money::new(Decimal::MAX);
        assert!(matches!(huge.checked_add(Money::new(Decimal::ONE)), Err(MoneyError::Overflow)));
        assert!(matches!(huge.checked_mul(Quantity::new(2).unwrap()), Err(MoneyError::Overflow)));
        assert!(matches!(Money::try_sum([huge, huge]), Err(MoneyError::Overflow)));
        assert!(matches!(huge.to_minor_units(), Err(MoneyError::Overflow)));
        let past_i64 = Money::new(Decimal::from(i64::MAX));
        assert!(matches!(past_i64.to_minor_units(), Err(MoneyError::Overflow)));
    }

    #[test]
    fn test_price_limits() {
        assert!(!Money::new(Decimal::new(1050, 2)).exceeds_price_scale());
        assert!(!Money::new(Decimal::new(10500, 3)).exceeds_price_scale());
        assert!(Money::new(Decimal::new(10505, 3)).exceeds_price_scale());
        assert_eq!(Money::max_price().to_minor_units().unwrap(), 999_999_999_999);
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(Money::new(Decimal::new(1999, 2)).to_minor_units().unwrap(), 1999);
        assert_eq!(Money::new(Decimal::new(10005, 3)).to_minor_units().unwrap(), 1001);
        assert_eq!(Money::new(Decimal::from(20)).to_minor_units().unwrap(), 2000);
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(Quantity::new(0).is_none());
        assert_eq!(Quantity::ONE.increment().value(), 2);
        assert!(Quantity::ONE.decrement().is_none());
        assert_eq!(Quantity::new(2).unwrap().decrement(), Some(Quantity::ONE));
    }
}
