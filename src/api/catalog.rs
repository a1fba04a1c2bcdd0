//! Shops, categories, items, reviews and wish lists

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::extract::ValidatedJson;
use crate::auth::{CurrentShop, CurrentUser};
use crate::domain::aggregates::{Category, Item, NewItem, Review, Shop};
use crate::domain::value_objects::Money;
use crate::services::catalog::{self, CategoryChanges, ItemChanges, ItemView, ShopChanges};
use crate::state::AppState;
use crate::Result;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ShopPatchRequest {
    #[validate(length(min = 1, max = 100))]
    pub shop_name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CategoryPatchRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ItemRequest {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1))]
    pub image: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: String,
    pub price: Decimal,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ItemPatchRequest {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub image: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub stars: i16,
    #[validate(length(min = 1, max = 2000))]
    pub comment: String,
}

pub async fn get_shop(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<Shop>> {
    Ok(Json(catalog::get_shop(state.store.as_ref(), &slug).await?))
}

pub async fn update_shop(
    State(state): State<AppState>,
    CurrentShop { shop, .. }: CurrentShop,
    ValidatedJson(req): ValidatedJson<ShopPatchRequest>,
) -> Result<Json<Shop>> {
    let changes = ShopChanges { shop_name: req.shop_name, description: req.description };
    Ok(Json(catalog::update_shop(state.store.as_ref(), shop, changes).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    CurrentShop { shop, .. }: CurrentShop,
    ValidatedJson(req): ValidatedJson<CategoryRequest>,
) -> Result<Json<Category>> {
    Ok(Json(catalog::create_category(state.store.as_ref(), &shop, req.name).await?))
}

pub async fn update_category(
    State(state): State<AppState>,
    CurrentShop { shop, .. }: CurrentShop,
    Path(slug): Path<String>,
    ValidatedJson(req): ValidatedJson<CategoryPatchRequest>,
) -> Result<Json<Category>> {
    let changes = CategoryChanges { name: req.name, is_available: req.is_available };
    Ok(Json(catalog::update_category(state.store.as_ref(), &shop, &slug, changes).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    CurrentShop { shop, .. }: CurrentShop,
    Path(slug): Path<String>,
) -> Result<Json<Category>> {
    Ok(Json(catalog::delete_category(state.store.as_ref(), &shop, &slug).await?))
}

pub async fn create_item(
    State(state): State<AppState>,
    CurrentShop { shop, .. }: CurrentShop,
    ValidatedJson(req): ValidatedJson<ItemRequest>,
) -> Result<Json<Item>> {
    let new = NewItem {
        category_id: req.category_id,
        name: req.name,
        image: req.image,
        title: req.title,
        description: req.description,
        price: Money::new(req.price),
    };
    Ok(Json(catalog::create_item(state.store.as_ref(), &shop, new).await?))
}

pub async fn get_item(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<ItemView>> {
    Ok(Json(catalog::get_item(state.store.as_ref(), &slug).await?))
}

pub async fn update_item(
    State(state): State<AppState>,
    CurrentShop { shop, .. }: CurrentShop,
    Path(slug): Path<String>,
    ValidatedJson(req): ValidatedJson<ItemPatchRequest>,
) -> Result<Json<Item>> {
    let changes = ItemChanges {
        category_id: req.category_id,
        name: req.name,
        image: req.image,
        title: req.title,
        description: req.description,
        price: req.price.map(Money::new),
        is_available: req.is_available,
    };
    Ok(Json(catalog::update_item(state.store.as_ref(), &shop, &slug, changes).await?))
}

pub async fn delete_item(
    State(state): State<AppState>,
    CurrentShop { shop, .. }: CurrentShop,
    Path(slug): Path<String>,
) -> Result<Json<Item>> {
    Ok(Json(catalog::delete_item(state.store.as_ref(), &shop, &slug).await?))
}

pub async fn add_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    ValidatedJson(req): ValidatedJson<ReviewRequest>,
) -> Result<Json<Review>> {
    Ok(Json(catalog::add_review(state.store.as_ref(), &user, &slug, req.stars, req.comment).await?))
}

pub async fn toggle_wish(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let detail = if catalog::toggle_wish(state.store.as_ref(), user.id, &slug).await? {
        "Item added to the wish list."
    } else {
        "Item removed from the wish list."
    };
    Ok(Json(json!({ "detail": detail })))
}

pub async fn wish_list(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Response> {
    let items = catalog::wish_list(state.store.as_ref(), user.id).await?;
    if items.is_empty() {
        return Ok(Json(json!({ "detail": "Wish list is empty." })).into_response());
    }
    Ok(Json(items).into_response())
}
