//! Shop admin panel

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::CurrentShop;
use crate::domain::aggregates::{Category, Item, ItemStats, ShopOrder, User};
use crate::services::catalog::{self, Revenue};
use crate::state::AppState;
use crate::{AppError, Result};

#[derive(Debug, Default, Deserialize)]
pub struct RevenueQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn categories(State(state): State<AppState>, CurrentShop { shop, .. }: CurrentShop) -> Result<Json<Vec<Category>>> {
    Ok(Json(catalog::admin_categories(state.store.as_ref(), shop.id).await?))
}

pub async fn items(State(state): State<AppState>, CurrentShop { shop, .. }: CurrentShop) -> Result<Json<Vec<Item>>> {
    Ok(Json(catalog::admin_items(state.store.as_ref(), shop.id).await?))
}

pub async fn customers(State(state): State<AppState>, CurrentShop { shop, .. }: CurrentShop) -> Result<Json<Vec<User>>> {
    Ok(Json(catalog::admin_customers(state.store.as_ref(), shop.id).await?))
}

pub async fn customer_orders(
    State(state): State<AppState>,
    CurrentShop { shop, .. }: CurrentShop,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<ShopOrder>>> {
    let buyer_id = Uuid::parse_str(&raw_id).map_err(|_| AppError::not_found("User"))?;
    Ok(Json(catalog::admin_customer_orders(state.store.as_ref(), shop.id, buyer_id).await?))
}

pub async fn item_stats(
    State(state): State<AppState>,
    CurrentShop { shop, .. }: CurrentShop,
) -> Result<Json<BTreeMap<String, ItemStats>>> {
    Ok(Json(catalog::item_stats(state.store.as_ref(), shop.id).await?))
}

pub async fn revenue(
    State(state): State<AppState>,
    CurrentShop { shop, .. }: CurrentShop,
    Query(q): Query<RevenueQuery>,
) -> Result<Json<Value>> {
    let body = match catalog::revenue(state.store.as_ref(), shop.id, q.start_date, q.end_date).await? {
        Revenue::Filtered(amount) => json!({ "Revenue": amount }),
        Revenue::Total(amount) => json!({ "Total revenue": amount }),
    };
    Ok(Json(body))
}
