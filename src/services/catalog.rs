//! Catalog: shops, categories, items, reviews, wish lists and the shop admin panel

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::{item_by_path, unique_slug};
use crate::domain::aggregates::{average_rating, Category, Item, ItemStats, NewItem, Review, Shop, ShopOrder, User};
use crate::domain::patch::FieldDiff;
use crate::domain::value_objects::{Money, Slug};
use crate::store::{Period, SlugScope, Store};
use crate::{AppError, Result};

#[derive(Debug, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,
    pub average_rating: Decimal,
    pub reviews: Vec<Review>,
}

#[derive(Clone, Debug, Default)]
pub struct ShopChanges {
    pub shop_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct ItemChanges {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub is_available: Option<bool>,
}

/// Shop revenue, either over a date window or for all time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Revenue {
    Filtered(Money),
    Total(Money),
}

fn ensure_price(price: Money) -> Result<()> {
    if price.is_negative() {
        return Err(AppError::Unprocessable("Price must not be negative.".into()));
    }
    if price.exceeds_price_scale() {
        return Err(AppError::Unprocessable("Price must have at most two decimal places.".into()));
    }
    if price > Money::max_price() {
        return Err(AppError::Unprocessable(format!("Price must not exceed {}.", Money::max_price())));
    }
    Ok(())
}

// Shops

pub async fn get_shop(store: &dyn Store, raw_slug: &str) -> Result<Shop> {
    let slug = Slug::parse(raw_slug).ok_or_else(|| AppError::not_found("Shop"))?;
    store.shop_by_slug(&slug).await?.ok_or_else(|| AppError::not_found("Shop"))
}

/// Renaming a shop gives it a new slug.
pub async fn update_shop(store: &dyn Store, mut shop: Shop, changes: ShopChanges) -> Result<Shop> {
    let mut diff = FieldDiff::new();
    if let Some(name) = changes.shop_name.filter(|n| *n != shop.shop_name) {
        if store.shop_by_name(&name).await?.is_some() {
            return Err(AppError::conflict("Shop name is already taken."));
        }
        shop.slug = unique_slug(store, SlugScope::Shop, Slug::from_text(&name)?).await?;
        shop.shop_name = name;
        diff.record();
    }
    diff.apply(&mut shop.description, changes.description.map(Some));
    diff.finish()?;
    shop.touch();
    store.update_shop(&shop).await?;
    Ok(shop)
}

// Categories

async fn category_by_path(store: &dyn Store, shop_id: Uuid, raw_slug: &str) -> Result<Category> {
    let slug = Slug::parse(raw_slug).ok_or_else(|| AppError::not_found("Category"))?;
    store.category_by_slug(shop_id, &slug).await?.ok_or_else(|| AppError::not_found("Category"))
}

async fn ensure_free_category_name(store: &dyn Store, shop_id: Uuid, name: &str) -> Result<()> {
    if store.category_by_name(shop_id, name).await?.is_some() {
        return Err(AppError::conflict("Category name is already taken."));
    }
    Ok(())
}

pub async fn create_category(store: &dyn Store, shop: &Shop, name: String) -> Result<Category> {
    ensure_free_category_name(store, shop.id, &name).await?;
    let slug = unique_slug(store, SlugScope::Category, Slug::scoped(&shop.shop_name, &name)?).await?;
    let category = Category::create(shop.id, name, slug);
    store.insert_category(&category).await?;
    Ok(category)
}

pub async fn update_category(store: &dyn Store, shop: &Shop, raw_slug: &str, changes: CategoryChanges) -> Result<Category> {
    let mut category = category_by_path(store, shop.id, raw_slug).await?;
    let mut diff = FieldDiff::new();
    if let Some(name) = changes.name.filter(|n| *n != category.name) {
        ensure_free_category_name(store, shop.id, &name).await?;
        category.slug = unique_slug(store, SlugScope::Category, Slug::scoped(&shop.shop_name, &name)?).await?;
        category.name = name;
        diff.record();
    }
    diff.apply(&mut category.is_available, changes.is_available);
    diff.finish()?;
    store.update_category(&category).await?;
    Ok(category)
}

pub async fn delete_category(store: &dyn Store, shop: &Shop, raw_slug: &str) -> Result<Category> {
    let category = category_by_path(store, shop.id, raw_slug).await?;
    store.delete_category(category.id).await?;
    Ok(category)
}

// Items

async fn ensure_shop_category(store: &dyn Store, shop_id: Uuid, category_id: Uuid) -> Result<()> {
    let categories = store.categories_for_shop(shop_id).await?;
    if !categories.iter().any(|c| c.id == category_id) {
        return Err(AppError::conflict("Category not found."));
    }
    Ok(())
}

async fn ensure_free_item_name(store: &dyn Store, shop_id: Uuid, name: &str) -> Result<()> {
    if store.item_by_name(shop_id, name).await?.is_some() {
        return Err(AppError::conflict("Item name is already taken."));
    }
    Ok(())
}

async fn shop_item(store: &dyn Store, shop: &Shop, raw_slug: &str) -> Result<Item> {
    let item = item_by_path(store, raw_slug).await?;
    if item.shop_id != shop.id {
        return Err(AppError::not_found("Item"));
    }
    Ok(item)
}

pub async fn create_item(store: &dyn Store, shop: &Shop, new: NewItem) -> Result<Item> {
    ensure_shop_category(store, shop.id, new.category_id).await?;
    ensure_free_item_name(store, shop.id, &new.name).await?;
    ensure_price(new.price)?;
    let slug = unique_slug(store, SlugScope::Item, Slug::scoped(&shop.shop_name, &new.name)?).await?;
    let item = Item::list(shop.id, slug, new);
    store.insert_item(&item).await?;
    tracing::info!(item_id = %item.id, shop_id = %shop.id, slug = %item.slug, "Item listed");
    Ok(item)
}

pub async fn get_item(store: &dyn Store, raw_slug: &str) -> Result<ItemView> {
    let item = item_by_path(store, raw_slug).await?;
    let reviews = store.reviews_for_item(item.id).await?;
    Ok(ItemView { average_rating: average_rating(&reviews), item, reviews })
}

pub async fn update_item(store: &dyn Store, shop: &Shop, raw_slug: &str, changes: ItemChanges) -> Result<Item> {
    let mut item = shop_item(store, shop, raw_slug).await?;
    let mut diff = FieldDiff::new();
    if let Some(name) = changes.name.filter(|n| *n != item.name) {
        ensure_free_item_name(store, shop.id, &name).await?;
        item.slug = unique_slug(store, SlugScope::Item, Slug::scoped(&shop.shop_name, &name)?).await?;
        item.name = name;
        diff.record();
    }
    if FieldDiff::differs(&item.category_id, changes.category_id.as_ref()) {
        if let Some(category_id) = changes.category_id {
            ensure_shop_category(store, shop.id, category_id).await?;
        }
    }
    if let Some(price) = changes.price {
        ensure_price(price)?;
    }
    diff.apply(&mut item.category_id, changes.category_id);
    diff.apply(&mut item.image, changes.image);
    diff.apply(&mut item.title, changes.title);
    diff.apply(&mut item.description, changes.description);
    diff.apply(&mut item.price, changes.price);
    diff.apply(&mut item.is_available, changes.is_available);
    diff.finish()?;
    store.update_item(&item).await?;
    Ok(item)
}

pub async fn delete_item(store: &dyn Store, shop: &Shop, raw_slug: &str) -> Result<Item> {
    let item = shop_item(store, shop, raw_slug).await?;
    store.delete_item(item.id).await?;
    Ok(item)
}

pub async fn add_review(store: &dyn Store, user: &User, raw_slug: &str, stars: i16, comment: String) -> Result<Review> {
    let item = item_by_path(store, raw_slug).await?;
    let review = Review::write(item.id, user.id, stars, comment);
    store.insert_review(&review).await?;
    Ok(review)
}

// Wish list

/// Returns `true` when the item was added, `false` when it was removed.
pub async fn toggle_wish(store: &dyn Store, user_id: Uuid, raw_slug: &str) -> Result<bool> {
    let item = item_by_path(store, raw_slug).await?;
    store.toggle_wish(user_id, item.id).await
}

pub async fn wish_list(store: &dyn Store, user_id: Uuid) -> Result<Vec<Item>> {
    store.wish_list(user_id).await
}

// Shop admin panel

pub async fn admin_categories(store: &dyn Store, shop_id: Uuid) -> Result<Vec<Category>> {
    let categories = store.categories_for_shop(shop_id).await?;
    if categories.is_empty() {
        return Err(AppError::conflict("No categories found"));
    }
    Ok(categories)
}

pub async fn admin_items(store: &dyn Store, shop_id: Uuid) -> Result<Vec<Item>> {
    let items = store.items_for_shop(shop_id).await?;
    if items.is_empty() {
        return Err(AppError::conflict("No items found"));
    }
    Ok(items)
}

pub async fn admin_customers(store: &dyn Store, shop_id: Uuid) -> Result<Vec<User>> {
    let users = store.shop_customers(shop_id).await?;
    if users.is_empty() {
        return Err(AppError::conflict("No users have ordered in your shop."));
    }
    Ok(users)
}

/// This shop's orders from one buyer, oldest first. Empty when they never ordered here.
pub async fn admin_customer_orders(store: &dyn Store, shop_id: Uuid, buyer_id: Uuid) -> Result<Vec<ShopOrder>> {
    store.shop_orders_for_buyer(shop_id, buyer_id).await
}

/// Per-item sales keyed by item id.
pub async fn item_stats(store: &dyn Store, shop_id: Uuid) -> Result<BTreeMap<String, ItemStats>> {
    let stats = store.item_stats(shop_id).await?;
    Ok(stats.into_iter().map(|s| (s.item_id.to_string(), s)).collect())
}

/// Both dates filter inclusively by day; with either one missing the all-time total is returned.
pub async fn revenue(store: &dyn Store, shop_id: Uuid, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Revenue> {
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(Revenue::Total(store.shop_revenue(shop_id, None).await?));
    };
    if start > end {
        return Err(AppError::conflict("Start date cannot be greater than end date."));
    }
    let period = Period {
        from: Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN)),
        to: Utc.from_utc_datetime(&end.and_hms_milli_opt(23, 59, 59, 999).unwrap_or(end.and_time(NaiveTime::MIN))),
    };
    Ok(Revenue::Filtered(store.shop_revenue(shop_id, Some(period)).await?))
}
