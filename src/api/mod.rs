//! HTTP API

pub mod accounts;
pub mod catalog;
pub mod extract;
pub mod newsletter;
pub mod orders;
pub mod shop_admin;

use axum::routing::{get, patch, post};
use axum::{Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "marketplace"})) }))
        // accounts
        .route("/signup/", post(accounts::signup))
        .route("/login", post(accounts::login))
        .route("/verification/", get(accounts::verify_email))
        .route("/user/me", get(accounts::me))
        .route("/user/", patch(accounts::update_user).delete(accounts::delete_user))
        .route("/user/:user_id", get(accounts::get_user))
        .route("/reset-password/", get(accounts::reset_password_form).post(accounts::request_password_reset))
        .route("/reset-password/verify/", get(accounts::verify_reset_token).post(accounts::reset_password))
        // catalog
        .route("/shop/", patch(catalog::update_shop))
        .route("/shop/:shop_slug", get(catalog::get_shop))
        .route("/category/", post(catalog::create_category))
        .route("/category/:category_slug/", patch(catalog::update_category).delete(catalog::delete_category))
        .route("/item/", post(catalog::create_item))
        .route("/item/:item_slug/", get(catalog::get_item).patch(catalog::update_item).delete(catalog::delete_item))
        .route("/item/:item_slug/reviews/", post(catalog::add_review))
        .route("/wish-list/", get(catalog::wish_list))
        .route("/wish-list/:item_slug", post(catalog::toggle_wish))
        .route("/wish-list/:item_slug/", post(catalog::toggle_wish))
        // cart and checkout
        .route("/cart/", get(orders::get_cart))
        .route("/order-details/", get(orders::order_details))
        .route("/add-to-the-cart/:item_slug", post(orders::add_to_cart))
        .route("/add-to-the-cart/:item_slug/", post(orders::add_to_cart))
        .route("/subtract-from-the-cart/:item_slug", post(orders::subtract_from_cart))
        .route("/subtract-from-the-cart/:item_slug/", post(orders::subtract_from_cart))
        .route("/create-order/", post(orders::create_order))
        .route("/stripe-webhook/", post(orders::stripe_webhook))
        // orders
        .route("/orders/", get(orders::list_orders))
        .route("/orders/:order_id", get(orders::get_order))
        .route("/shop-orders/", get(orders::list_shop_orders))
        .route("/shop-orders/:shop_order_id", get(orders::get_shop_order))
        .route("/shop-orders/:shop_order_id/", patch(orders::update_shop_order_status))
        // shop admin panel
        .route("/shop-admin/orders/", get(orders::list_shop_orders))
        .route("/shop-admin/orders/:shop_order_id", get(orders::get_shop_order))
        .route("/shop-admin/orders/:shop_order_id/", patch(orders::update_shop_order_status))
        .route("/shop-admin/categories/", get(shop_admin::categories))
        .route("/shop-admin/items/", get(shop_admin::items))
        .route("/shop-admin/users/", get(shop_admin::customers))
        .route("/shop-admin/users/:user_id", get(shop_admin::customer_orders))
        .route("/shop-admin/users/:user_id/", get(shop_admin::customer_orders))
        .route("/shop-admin/stats-items/", get(shop_admin::item_stats))
        .route("/shop-admin/revenue/", get(shop_admin::revenue))
        // newsletter
        .route("/newsletter/signup/", post(newsletter::sign_up))
        .route("/newsletter/verify/", get(newsletter::verify))
        .route("/newsletter/unsubscribe/", get(newsletter::unsubscribe))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
