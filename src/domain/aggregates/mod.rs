//! Aggregates module
pub mod user;
pub mod catalog;
pub mod cart;
pub mod order;
pub mod shop_order;
pub mod newsletter;

pub use user::{Role, User};
pub use catalog::{average_rating, Category, Item, ItemStats, NewItem, Review, Shop};
pub use cart::{Cart, CartEntry, CartLine, Subtracted};
pub use order::{CheckoutDraft, Order, OrderError, OrderLine, PlacedOrder, ShippingDetails};
pub use shop_order::{ShopOrder, ShopOrderStatus};
pub use newsletter::{Subscription, SubscriptionError};
