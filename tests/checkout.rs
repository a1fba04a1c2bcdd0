mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

use common::{shipping, Script, TestApp};
use marketplace::config::Config;

fn webhook_body(reference: &str, user_id: Option<&str>) -> Value {
    let metadata = match user_id {
        Some(id) => json!({ "user_id": id }),
        None => json!({}),
    };
    json!({
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": reference, "metadata": metadata } },
    })
}

async fn deliver_webhook(app: &TestApp, body: &Value, signature: Option<String>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(Method::POST).uri("/stripe-webhook/");
    if let Some(signature) = signature {
        builder = builder.header("Stripe-Signature", signature);
    }
    app.send(builder.body(Body::from(body.to_string())).unwrap()).await
}

/// Buyer with one unit of a 10.00 item from shop A and two units of a 5.00 item from shop B.
async fn two_shop_cart(app: &TestApp) -> (String, common::Seller, common::Seller) {
    let alpha = app.seller("alpha", "Alpha Goods").await;
    let beta = app.seller("beta", "Beta Goods").await;
    let lamp = app.list_item(&alpha, "lamp", 10.0).await;
    let mug = app.list_item(&beta, "mug", 5.0).await;

    let buyer = app.customer("carol").await;
    assert_eq!(app.post(&format!("/add-to-the-cart/{lamp}"), &buyer, None).await.0, StatusCode::OK);
    assert_eq!(app.post(&format!("/add-to-the-cart/{mug}"), &buyer, None).await.0, StatusCode::OK);
    assert_eq!(app.post(&format!("/add-to-the-cart/{mug}/"), &buyer, None).await.0, StatusCode::OK);
    (buyer, alpha, beta)
}

#[tokio::test]
async fn test_checkout_fans_out_one_shop_order_per_shop() {
    let app = TestApp::new();
    let (buyer, alpha, beta) = two_shop_cart(&app).await;

    let (status, cart) = app.get("/cart/", &buyer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_amount"].as_f64(), Some(20.0));

    let (status, order) = app.post("/create-order/", &buyer, Some(shipping())).await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["total_paid"].as_f64(), Some(20.0));
    assert_eq!(order["billing_status"], json!(false));
    assert_eq!(order["city"], "Springfield");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    let payment = app.gateway.requests.lock()[0].clone();
    assert_eq!(payment.amount, 2000);
    assert_eq!(payment.currency, "usd");

    let (_, alpha_orders) = app.get("/shop-orders/", &alpha.token).await;
    let (_, beta_orders) = app.get("/shop-orders/", &beta.token).await;
    let alpha_orders = alpha_orders.as_array().unwrap().clone();
    let beta_orders = beta_orders.as_array().unwrap().clone();
    assert_eq!(alpha_orders.len(), 1);
    assert_eq!(beta_orders.len(), 1);
    assert_eq!(alpha_orders[0]["total_paid"].as_f64(), Some(10.0));
    assert_eq!(beta_orders[0]["total_paid"].as_f64(), Some(10.0));
    assert_eq!(alpha_orders[0]["status"], "New");
    assert_eq!(alpha_orders[0]["order_id"], order["id"]);

    let (_, cart) = app.get("/cart/", &buyer).await;
    assert_eq!(cart["cart_items"], json!([]));
    assert_eq!(cart["total_amount"].as_f64(), Some(0.0));

    let (status, orders) = app.get("/orders/", &buyer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let (status, detail) = app.get(&format!("/orders/{}", order["id"].as_str().unwrap()), &buyer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["items"].as_array().unwrap().len(), 2);

    let emails = app.wait_for_emails(4).await;
    assert!(emails.iter().any(|e| e.to == "carol@example.com" && e.subject == "Your order has been placed"));
}

#[tokio::test]
async fn test_checkout_of_empty_cart_is_rejected() {
    let app = TestApp::new();
    let buyer = app.customer("dave").await;

    let (status, body) = app.post("/create-order/", &buyer, Some(shipping())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Cart is empty.");
    assert!(app.gateway.requests.lock().is_empty());

    let (status, body) = app.get("/orders/", &buyer).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "You have no orders yet.");
}

#[tokio::test]
async fn test_declined_payment_leaves_cart_and_orders_untouched() {
    let app = TestApp::new();
    let (buyer, alpha, _) = two_shop_cart(&app).await;
    app.gateway.push(Script::Decline("Your card was declined."));

    let (status, body) = app.post("/create-order/", &buyer, Some(shipping())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Your card was declined.");

    let (_, cart) = app.get("/cart/", &buyer).await;
    assert_eq!(cart["cart_items"].as_array().unwrap().len(), 2);
    assert_eq!(app.get("/orders/", &buyer).await.0, StatusCode::CONFLICT);
    assert_eq!(app.get("/shop-orders/", &alpha.token).await.0, StatusCode::CONFLICT);

    // The same cart can be checked out once the provider approves.
    let (status, _) = app.post("/create-order/", &buyer, Some(shipping())).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_payment_timeout_writes_nothing() {
    let mut config = Config::development();
    config.payment_timeout = Duration::from_millis(50);
    let app = TestApp::with_config(config);
    let (buyer, _, _) = two_shop_cart(&app).await;
    app.gateway.push(Script::Stall(Duration::from_secs(2)));

    let (status, body) = app.post("/create-order/", &buyer, Some(shipping())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Payment provider did not answer in time");

    let (_, cart) = app.get("/cart/", &buyer).await;
    assert_eq!(cart["cart_items"].as_array().unwrap().len(), 2);
    assert_eq!(app.get("/orders/", &buyer).await.0, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_shipping_details_are_unprocessable() {
    let app = TestApp::new();
    let (buyer, _, _) = two_shop_cart(&app).await;
    let mut body = shipping();
    body["city"] = json!("");

    let (status, _) = app.post("/create-order/", &buyer, Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.gateway.requests.lock().is_empty());
}

#[tokio::test]
async fn test_concurrent_checkouts_consume_the_cart_once() {
    let app = TestApp::new();
    let (buyer, alpha, _) = two_shop_cart(&app).await;
    // Both requests price the cart, then wait on the provider together.
    app.gateway.push(Script::Stall(Duration::from_millis(50)));
    app.gateway.push(Script::Stall(Duration::from_millis(50)));

    let (first, second) = futures::future::join(
        app.post("/create-order/", &buyer, Some(shipping())),
        app.post("/create-order/", &buyer, Some(shipping())),
    )
    .await;
    assert_eq!(app.gateway.issued.lock().len(), 2, "both checkouts reached the provider");

    let (winner, loser) = if first.0 == StatusCode::OK { (first, second) } else { (second, first) };
    assert_eq!(winner.0, StatusCode::OK, "{}", winner.1);
    assert_eq!(loser.0, StatusCode::CONFLICT, "{}", loser.1);
    assert_eq!(loser.1["detail"], "Cart changed during checkout.");

    let (_, orders) = app.get("/orders/", &buyer).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["id"], winner.1["id"]);
    let (_, shop_orders) = app.get("/shop-orders/", &alpha.token).await;
    assert_eq!(shop_orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_webhook_confirms_order_and_every_shop_order() {
    let app = TestApp::new();
    let (buyer, alpha, beta) = two_shop_cart(&app).await;
    let (_, order) = app.post("/create-order/", &buyer, Some(shipping())).await;
    let reference = app.gateway.issued.lock()[0].clone();

    let (status, body) = deliver_webhook(&app, &webhook_body(&reference, Some("buyer")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "success" }));

    let (_, detail) = app.get(&format!("/orders/{}", order["id"].as_str().unwrap()), &buyer).await;
    assert_eq!(detail["billing_status"], json!(true));
    for seller in [&alpha, &beta] {
        let (_, shop_orders) = app.get("/shop-orders/", &seller.token).await;
        assert_eq!(shop_orders[0]["billing_status"], json!(true));
    }

    // Redelivery is harmless.
    let (status, _) = deliver_webhook(&app, &webhook_body(&reference, Some("buyer")), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_with_unknown_reference_mutates_nothing() {
    let app = TestApp::new();
    let (buyer, _, _) = two_shop_cart(&app).await;
    let (_, order) = app.post("/create-order/", &buyer, Some(shipping())).await;

    let (status, body) = deliver_webhook(&app, &webhook_body("pi_unknown", Some("buyer")), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Order not found.");

    let (_, detail) = app.get(&format!("/orders/{}", order["id"].as_str().unwrap()), &buyer).await;
    assert_eq!(detail["billing_status"], json!(false));
}

#[tokio::test]
async fn test_webhook_without_buyer_metadata_is_acknowledged() {
    let app = TestApp::new();
    let (status, body) = deliver_webhook(&app, &webhook_body("pi_1", None), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "error": "User ID not found" }));

    let other = json!({ "type": "charge.refunded", "data": { "object": {} } });
    let (status, body) = deliver_webhook(&app, &other, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "success" }));
}

#[tokio::test]
async fn test_webhook_signature_is_checked_when_secret_configured() {
    let mut config = Config::development();
    config.stripe_webhook_secret = Some("whsec_integration".into());
    let app = TestApp::with_config(config);
    let (buyer, _, _) = two_shop_cart(&app).await;
    let (_, order) = app.post("/create-order/", &buyer, Some(shipping())).await;
    let reference = app.gateway.issued.lock()[0].clone();
    let body = webhook_body(&reference, Some("buyer"));

    let (status, _) = deliver_webhook(&app, &body, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let timestamp = chrono::Utc::now().timestamp();
    let mut forged = Hmac::<Sha256>::new_from_slice(b"wrong-secret").unwrap();
    forged.update(format!("{timestamp}.{body}").as_bytes());
    let forged = format!("t={timestamp},v1={}", hex::encode(forged.finalize().into_bytes()));
    let (status, _) = deliver_webhook(&app, &body, Some(forged)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut mac = Hmac::<Sha256>::new_from_slice(b"whsec_integration").unwrap();
    mac.update(format!("{timestamp}.{body}").as_bytes());
    let signature = format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()));
    let (status, _) = deliver_webhook(&app, &body, Some(signature)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = app.get(&format!("/orders/{}", order["id"].as_str().unwrap()), &buyer).await;
    assert_eq!(detail["billing_status"], json!(true));
}

#[tokio::test]
async fn test_shop_order_status_transitions() {
    let app = TestApp::new();
    let (buyer, alpha, beta) = two_shop_cart(&app).await;
    app.post("/create-order/", &buyer, Some(shipping())).await;
    let (_, shop_orders) = app.get("/shop-orders/", &alpha.token).await;
    let id = shop_orders[0]["id"].as_str().unwrap().to_string();
    let uri = format!("/shop-orders/{id}/");

    let (status, body) = app.patch(&uri, &alpha.token, json!({ "status": "New" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "Model was not changed.");

    let (status, _) = app.patch(&uri, &alpha.token, json!({ "status": "Delivered" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = app.patch(&uri, &alpha.token, json!({ "status": "In Process" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "In Process");

    let (status, body) = app.patch(&uri, &alpha.token, json!({ "status": "Sent" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Sent");

    let (_, fetched) = app.get(&format!("/shop-orders/{id}"), &alpha.token).await;
    assert_eq!(fetched["status"], "Sent");

    // Another shop cannot see or touch it.
    assert_eq!(app.get(&format!("/shop-orders/{id}"), &beta.token).await.0, StatusCode::NOT_FOUND);
    assert_eq!(app.patch(&uri, &beta.token, json!({ "status": "New" })).await.0, StatusCode::NOT_FOUND);

    // Customers are not shops.
    assert_eq!(app.get("/shop-orders/", &buyer).await.0, StatusCode::FORBIDDEN);

    let emails = app.wait_for_emails(6).await;
    let updates: Vec<_> = emails.iter().filter(|e| e.subject == "Your order status has changed").collect();
    assert_eq!(updates.len(), 2);
    assert!(updates[1].html.contains("Sent"));
}

#[tokio::test]
async fn test_shop_admin_manages_its_orders() {
    let app = TestApp::new();
    let (buyer, alpha, beta) = two_shop_cart(&app).await;
    app.post("/create-order/", &buyer, Some(shipping())).await;
    let (_, shop_orders) = app.get("/shop-admin/orders/", &alpha.token).await;
    let id = shop_orders[0]["id"].as_str().unwrap().to_string();

    let (status, fetched) = app.get(&format!("/shop-admin/orders/{id}"), &alpha.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "New");
    assert_eq!(fetched["total_paid"].as_f64(), Some(10.0));

    let uri = format!("/shop-admin/orders/{id}/");
    let (status, body) = app.patch(&uri, &alpha.token, json!({ "status": "In Process" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "In Process");
    let (_, fetched) = app.get(&format!("/shop-orders/{id}"), &alpha.token).await;
    assert_eq!(fetched["status"], "In Process");

    assert_eq!(app.get(&format!("/shop-admin/orders/{id}"), &beta.token).await.0, StatusCode::NOT_FOUND);
    assert_eq!(app.patch(&uri, &beta.token, json!({ "status": "Sent" })).await.0, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/shop-admin/orders/not-a-uuid", &alpha.token).await.0, StatusCode::NOT_FOUND);
    assert_eq!(app.get(&format!("/shop-admin/orders/{id}"), &buyer).await.0, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_shop_admin_lists_orders_of_one_customer() {
    let app = TestApp::new();
    let (buyer, alpha, beta) = two_shop_cart(&app).await;
    let (_, order) = app.post("/create-order/", &buyer, Some(shipping())).await;
    let (_, me) = app.get("/user/me", &buyer).await;
    let buyer_id = me["id"].as_str().unwrap().to_string();

    let (status, orders) = app.get(&format!("/shop-admin/users/{buyer_id}/"), &alpha.token).await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().unwrap().clone();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["order_id"], order["id"]);
    assert_eq!(orders[0]["total_paid"].as_f64(), Some(10.0));

    let (_, orders) = app.get(&format!("/shop-admin/users/{buyer_id}"), &beta.token).await;
    assert_eq!(orders[0]["total_paid"].as_f64(), Some(10.0));

    let stranger = app.customer("erin").await;
    let (_, stranger_me) = app.get("/user/me", &stranger).await;
    let uri = format!("/shop-admin/users/{}/", stranger_me["id"].as_str().unwrap());
    let (status, orders) = app.get(&uri, &alpha.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders, json!([]));

    let (status, body) = app.get("/shop-admin/users/not-a-uuid/", &alpha.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User not found.");
}

#[tokio::test]
async fn test_shop_admin_item_stats() {
    let app = TestApp::new();
    let (buyer, alpha, beta) = two_shop_cart(&app).await;
    let (status, _) = app.post("/create-order/", &buyer, Some(shipping())).await;
    assert_eq!(status, StatusCode::OK);
    let (_, beta_items) = app.get("/shop-admin/items/", &beta.token).await;
    let mug = beta_items[0].clone();
    let mug_slug = mug["slug"].as_str().unwrap();
    assert_eq!(app.post(&format!("/wish-list/{mug_slug}/"), &buyer, None).await.0, StatusCode::OK);

    let (status, stats) = app.get("/shop-admin/stats-items/", &beta.token).await;
    assert_eq!(status, StatusCode::OK);
    let entry = &stats[mug["id"].as_str().unwrap()];
    assert_eq!(entry["name"], "mug");
    assert_eq!(entry["quantity"], 2);
    assert_eq!(entry["price"].as_f64(), Some(10.0));
    assert_eq!(entry["wish_list_count"], 1);
    assert!(entry.get("item_id").is_none());

    let (_, alpha_stats) = app.get("/shop-admin/stats-items/", &alpha.token).await;
    assert_eq!(alpha_stats.as_object().unwrap().len(), 1);
    let (_, lamp) = alpha_stats.as_object().unwrap().iter().next().unwrap();
    assert_eq!(lamp["price"].as_f64(), Some(10.0));
    assert_eq!(lamp["wish_list_count"], 0);

    assert_eq!(app.get("/shop-admin/stats-items/", &buyer).await.0, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_order_ids_are_scoped_to_the_buyer() {
    let app = TestApp::new();
    let (buyer, _, _) = two_shop_cart(&app).await;
    let (_, order) = app.post("/create-order/", &buyer, Some(shipping())).await;
    let stranger = app.customer("erin").await;

    let uri = format!("/orders/{}", order["id"].as_str().unwrap());
    assert_eq!(app.get(&uri, &stranger).await.0, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/orders/not-a-uuid", &buyer).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_requires_authentication() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::POST, "/create-order/", None, Some(shipping())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Could not validate credentials");
}
