//! Catalog Aggregates: shops, categories, items and their reviews

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use crate::domain::value_objects::{Money, Slug};

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Shop {
    pub id: Uuid,
    #[serde(skip)]
    pub owner_id: Uuid,
    pub shop_name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Shop {
    pub fn open(owner_id: Uuid, shop_name: impl Into<String>, slug: Slug) -> Self {
        Self {
            id: Uuid::now_v7(), owner_id, shop_name: shop_name.into(), slug, description: None,
            created_at: Utc::now(), modified_at: None,
        }
    }

    pub fn touch(&mut self) { self.modified_at = Some(Utc::now()); }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub slug: Slug,
    pub is_available: bool,
}

impl Category {
    pub fn create(shop_id: Uuid, name: impl Into<String>, slug: Slug) -> Self {
        Self { id: Uuid::now_v7(), shop_id, name: name.into(), slug, is_available: true }
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Item {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub slug: Slug,
    pub image: String,
    pub title: String,
    pub description: String,
    pub price: Money,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to list a new item.
#[derive(Clone, Debug)]
pub struct NewItem {
    pub category_id: Uuid,
    pub name: String,
    pub image: String,
    pub title: String,
    pub description: String,
    pub price: Money,
}

impl Item {
    pub fn list(shop_id: Uuid, slug: Slug, new: NewItem) -> Self {
        Self {
            id: Uuid::now_v7(), shop_id, category_id: new.category_id, name: new.name, slug,
            image: new.image, title: new.title, description: new.description, price: new.price,
            is_available: true, created_at: Utc::now(),
        }
    }

    /// Only available items can be put into a cart.
    pub fn is_purchasable(&self) -> bool { self.is_available }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub item_id: Uuid,
    pub user_id: Uuid,
    pub stars: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn write(item_id: Uuid, user_id: Uuid, stars: i16, comment: impl Into<String>) -> Self {
        Self { id: Uuid::now_v7(), item_id, user_id, stars, comment: comment.into(), created_at: Utc::now() }
    }
}

/// Sales figures for one item of a shop, across every order placed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ItemStats {
    #[serde(skip)]
    pub item_id: Uuid,
    pub name: String,
    /// Units sold.
    pub quantity: i64,
    /// Sum of the sold line totals.
    pub price: Money,
    pub wish_list_count: i64,
}

/// Mean star rating rounded to two decimals; zero when there are no reviews.
pub fn average_rating(reviews: &[Review]) -> Decimal {
    if reviews.is_empty() { return Decimal::ZERO; }
    let sum: i64 = reviews.iter().map(|r| i64::from(r.stars)).sum();
    (Decimal::from(sum) / Decimal::from(reviews.len())).round_dp(2)
}
