//! Persistence
//!
//! [`Store`] is the only way services reach the database. Every method is one
//! unit of work: multi-row writes such as [`Store::place_order`] and
//! [`Store::confirm_payment`] are applied completely or not at all.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::aggregates::{
    CartEntry, CartLine, Category, Item, ItemStats, Order, OrderLine, PlacedOrder, Review, Shop, ShopOrder,
    ShopOrderStatus, Subscription, User,
};
use crate::domain::value_objects::{Money, Slug};
use crate::Result;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Which table a slug must be unique in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlugScope {
    Shop,
    Category,
    Item,
}

/// Inclusive creation-time window for revenue reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Period {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Period {
    pub fn contains(&self, at: DateTime<Utc>) -> bool { at >= self.from && at <= self.to }
}

#[async_trait]
pub trait Store: Send + Sync {
    // Accounts
    async fn create_user(&self, user: &User, shop: Option<&Shop>) -> Result<()>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn update_user(&self, user: &User) -> Result<()>;
    /// Removes the user together with their shop, catalog, cart and wish list.
    async fn delete_user(&self, id: Uuid) -> Result<bool>;

    // Catalog
    async fn slug_taken(&self, scope: SlugScope, slug: &Slug) -> Result<bool>;
    async fn shop_by_owner(&self, owner_id: Uuid) -> Result<Option<Shop>>;
    async fn shop_by_slug(&self, slug: &Slug) -> Result<Option<Shop>>;
    async fn shop_by_name(&self, shop_name: &str) -> Result<Option<Shop>>;
    async fn update_shop(&self, shop: &Shop) -> Result<()>;

    async fn insert_category(&self, category: &Category) -> Result<()>;
    async fn category_by_slug(&self, shop_id: Uuid, slug: &Slug) -> Result<Option<Category>>;
    async fn category_by_name(&self, shop_id: Uuid, name: &str) -> Result<Option<Category>>;
    async fn categories_for_shop(&self, shop_id: Uuid) -> Result<Vec<Category>>;
    async fn update_category(&self, category: &Category) -> Result<()>;
    async fn delete_category(&self, id: Uuid) -> Result<()>;

    async fn insert_item(&self, item: &Item) -> Result<()>;
    async fn item_by_slug(&self, slug: &Slug) -> Result<Option<Item>>;
    async fn item_by_name(&self, shop_id: Uuid, name: &str) -> Result<Option<Item>>;
    async fn items_for_shop(&self, shop_id: Uuid) -> Result<Vec<Item>>;
    async fn update_item(&self, item: &Item) -> Result<()>;
    async fn delete_item(&self, id: Uuid) -> Result<()>;

    async fn insert_review(&self, review: &Review) -> Result<()>;
    async fn reviews_for_item(&self, item_id: Uuid) -> Result<Vec<Review>>;

    /// Adds the item to the wish list, or removes it if already there. Returns `true` when added.
    async fn toggle_wish(&self, user_id: Uuid, item_id: Uuid) -> Result<bool>;
    async fn wish_list(&self, user_id: Uuid) -> Result<Vec<Item>>;

    // Cart
    async fn cart_line(&self, user_id: Uuid, item_id: Uuid) -> Result<Option<CartLine>>;
    /// Adds one unit of `item` to the user's cart in a single step, pricing the line at `item.price`.
    async fn add_cart_unit(&self, user_id: Uuid, item: &Item) -> Result<CartLine>;
    async fn save_cart_line(&self, line: &CartLine) -> Result<()>;
    async fn delete_cart_line(&self, user_id: Uuid, item_id: Uuid) -> Result<()>;
    async fn cart_entries(&self, user_id: Uuid) -> Result<Vec<CartEntry>>;

    /// Writes the order, its lines and shop orders and empties the buyer's cart.
    ///
    /// The buyer's cart must still hold exactly `consumed`; otherwise nothing
    /// is written and a conflict is returned, so a cart cannot be spent twice.
    async fn place_order(&self, placed: &PlacedOrder, consumed: &[CartLine]) -> Result<()>;

    // Orders
    async fn orders_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>>;
    async fn order_for_buyer(&self, buyer_id: Uuid, order_id: Uuid) -> Result<Option<Order>>;
    async fn order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>>;
    async fn order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>>;
    /// Marks the order and all of its shop orders as paid. Returns the number of shop orders touched.
    async fn confirm_payment(&self, order_id: Uuid) -> Result<usize>;

    async fn shop_orders_for_shop(&self, shop_id: Uuid) -> Result<Vec<ShopOrder>>;
    async fn shop_order(&self, shop_id: Uuid, shop_order_id: Uuid) -> Result<Option<ShopOrder>>;
    async fn shop_orders_for_buyer(&self, shop_id: Uuid, buyer_id: Uuid) -> Result<Vec<ShopOrder>>;
    async fn set_shop_order_status(&self, shop_order_id: Uuid, status: ShopOrderStatus) -> Result<()>;
    async fn shop_revenue(&self, shop_id: Uuid, period: Option<Period>) -> Result<Money>;
    async fn shop_customers(&self, shop_id: Uuid) -> Result<Vec<User>>;
    /// One entry per item the shop currently lists, including items that never sold.
    async fn item_stats(&self, shop_id: Uuid) -> Result<Vec<ItemStats>>;

    // Newsletter
    async fn subscription_by_email(&self, email: &str) -> Result<Option<Subscription>>;
    async fn save_subscription(&self, subscription: &Subscription) -> Result<()>;
}
