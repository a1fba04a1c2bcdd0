//! Cart, checkout and order endpoints

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use super::extract::ValidatedJson;
use crate::auth::{CurrentShop, CurrentUser};
use crate::domain::aggregates::{CartLine, Order, ShippingDetails, ShopOrder, ShopOrderStatus};
use crate::payment::stripe::verify_signature;
use crate::payment::PaymentEvent;
use crate::services::cart::{self, CartView, SubtractOutcome};
use crate::services::checkout::{self, PaymentSettings};
use crate::services::orders::{self, parse_order_id, OrderDetail};
use crate::state::AppState;
use crate::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 5, max = 20))]
    pub phone_number: String,
    #[validate(length(min = 1, max = 250))]
    pub address: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 20))]
    pub pin_code: String,
}

impl From<CreateOrderRequest> for ShippingDetails {
    fn from(r: CreateOrderRequest) -> Self {
        Self {
            first_name: r.first_name, last_name: r.last_name, phone_number: r.phone_number,
            address: r.address, country: r.country, city: r.city, pin_code: r.pin_code,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StatusRequest {
    pub status: ShopOrderStatus,
}

// Cart

pub async fn get_cart(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<CartView>> {
    Ok(Json(CartView::try_from(cart::list_cart(state.store.as_ref(), user.id).await?)?))
}

/// Checkout preview: the lines an order would be made of.
pub async fn order_details(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Vec<CartLine>>> {
    Ok(Json(cart::list_cart(state.store.as_ref(), user.id).await?.into_lines()))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_slug): Path<String>,
) -> Result<Json<CartLine>> {
    Ok(Json(cart::add_to_cart(state.store.as_ref(), user.id, &item_slug).await?))
}

pub async fn subtract_from_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_slug): Path<String>,
) -> Result<Response> {
    let response = match cart::subtract_from_cart(state.store.as_ref(), user.id, &item_slug).await? {
        SubtractOutcome::Decremented(line) => Json(line).into_response(),
        SubtractOutcome::Removed => Json(json!({ "detail": "Item removed from the cart." })).into_response(),
        SubtractOutcome::AlreadyRemoved => Json(json!({ "detail": "Item already removed from the cart." })).into_response(),
    };
    Ok(response)
}

// Checkout

pub async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateOrderRequest>,
) -> Result<Json<OrderDetail>> {
    let settings = PaymentSettings {
        currency: state.config.payment_currency.clone(),
        timeout: state.config.payment_timeout,
    };
    let placed = checkout::place_order(
        state.store.as_ref(),
        state.payments.as_ref(),
        &state.notifier,
        &settings,
        &user,
        req.into(),
    )
    .await?;
    Ok(Json(OrderDetail { order: placed.order, items: placed.lines }))
}

/// Payment provider callback. Unauthenticated; signed when a webhook secret is configured.
pub async fn stripe_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<Value>> {
    if let Some(secret) = state.config.stripe_webhook_secret.as_deref() {
        let signature = headers
            .get("Stripe-Signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".into()))?;
        verify_signature(&body, signature, secret, chrono::Utc::now().timestamp()).map_err(|e| {
            tracing::warn!(error = e, "Rejected webhook");
            AppError::BadRequest(e.into())
        })?;
    }

    let event = PaymentEvent::parse(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    match event {
        PaymentEvent::Succeeded { buyer_id: None, reference } => {
            tracing::warn!(%reference, "Payment event without buyer metadata");
            Ok(Json(json!({ "error": "User ID not found" })))
        }
        PaymentEvent::Succeeded { reference, .. } => {
            orders::confirm_payment(state.store.as_ref(), &state.notifier, &reference).await?;
            Ok(Json(json!({ "status": "success" })))
        }
        PaymentEvent::Other(kind) => {
            tracing::debug!(%kind, "Ignoring payment event");
            Ok(Json(json!({ "status": "success" })))
        }
    }
}

// Buyer orders

pub async fn list_orders(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Vec<Order>>> {
    Ok(Json(orders::list_orders(state.store.as_ref(), user.id).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(raw_id): Path<String>,
) -> Result<Json<OrderDetail>> {
    let order_id = parse_order_id(&raw_id)?;
    Ok(Json(orders::get_order(state.store.as_ref(), user.id, order_id).await?))
}

// Shop orders

pub async fn list_shop_orders(State(state): State<AppState>, CurrentShop { shop, .. }: CurrentShop) -> Result<Json<Vec<ShopOrder>>> {
    Ok(Json(orders::list_shop_orders(state.store.as_ref(), shop.id).await?))
}

pub async fn get_shop_order(
    State(state): State<AppState>,
    CurrentShop { shop, .. }: CurrentShop,
    Path(raw_id): Path<String>,
) -> Result<Json<ShopOrder>> {
    let shop_order_id = parse_order_id(&raw_id)?;
    Ok(Json(orders::get_shop_order(state.store.as_ref(), shop.id, shop_order_id).await?))
}

pub async fn update_shop_order_status(
    State(state): State<AppState>,
    CurrentShop { shop, .. }: CurrentShop,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<StatusRequest>,
) -> Result<Json<ShopOrder>> {
    let shop_order_id = parse_order_id(&raw_id)?;
    let updated = orders::update_shop_order_status(state.store.as_ref(), &state.notifier, shop.id, shop_order_id, req.status).await?;
    Ok(Json(updated))
}
