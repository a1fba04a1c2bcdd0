//! Marketplace
//!
//! Multi-shop e-commerce backend: accounts, shop catalogs, carts and a
//! checkout that turns one cart into one order plus a sub-order per shop.
//!
//! ## Features
//! - Shop and category/item management with unique slugs
//! - Per-user cart priced at the items' current prices
//! - Payment-first checkout with per-shop order fan-out
//! - Payment confirmation webhook
//! - Reviews, wish lists and a newsletter opt-in

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod payment;
pub mod services;
pub mod state;
pub mod store;

pub use error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
