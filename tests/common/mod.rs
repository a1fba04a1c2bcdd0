#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

use marketplace::config::Config;
use marketplace::notify::{Email, MailError, Mailer, Notifier};
use marketplace::payment::{PaymentError, PaymentGateway, PaymentIntent, PaymentRequest};
use marketplace::state::AppState;
use marketplace::store::MemoryStore;

pub enum Script {
    Approve,
    Decline(&'static str),
    Stall(Duration),
}

/// Approves every intent unless a script step says otherwise; records each request.
#[derive(Default)]
pub struct ScriptedGateway {
    steps: Mutex<VecDeque<Script>>,
    pub requests: Mutex<Vec<PaymentRequest>>,
    pub issued: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn push(&self, step: Script) { self.steps.lock().push_back(step); }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_intent(&self, request: &PaymentRequest) -> Result<PaymentIntent, PaymentError> {
        self.requests.lock().push(request.clone());
        let step = self.steps.lock().pop_front().unwrap_or(Script::Approve);
        match step {
            Script::Approve => {}
            Script::Decline(reason) => return Err(PaymentError::Declined(reason.into())),
            Script::Stall(delay) => tokio::time::sleep(delay).await,
        }
        let id = format!("pi_test_{}", self.issued.lock().len() + 1);
        self.issued.lock().push(id.clone());
        Ok(PaymentIntent { id })
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Email>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        self.sent.lock().push(email.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<ScriptedGateway>,
    pub mailer: Arc<RecordingMailer>,
}

pub struct Seller {
    pub token: String,
    pub shop_slug: String,
    pub shop_name: String,
}

impl TestApp {
    pub fn new() -> Self { Self::with_config(Config::development()) }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(ScriptedGateway::default());
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = Notifier::spawn(mailer.clone(), None, config.public_host.clone());
        let state = AppState::new(config, store.clone(), gateway.clone(), notifier);
        Self { router: marketplace::api::router(state), store, gateway, mailer }
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), body).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn signup(&self, username: &str, role: &str, shop_name: Option<&str>) -> (StatusCode, Value) {
        let mut body = json!({
            "first_name": "Test",
            "last_name": "User",
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "secret-password",
            "role": role,
        });
        if let Some(name) = shop_name {
            body["shop_name"] = json!(name);
        }
        self.call(Method::POST, "/signup/", None, Some(body)).await
    }

    pub async fn login(&self, username: &str) -> String {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username={username}%40example.com&password=secret-password")))
            .unwrap();
        let (status, body) = self.send(request).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn customer(&self, username: &str) -> String {
        let (status, body) = self.signup(username, "CUSTOMER", None).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        self.login(username).await
    }

    pub async fn seller(&self, username: &str, shop_name: &str) -> Seller {
        let (status, body) = self.signup(username, "SHOP", Some(shop_name)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let token = self.login(username).await;
        let (status, shop) = self.patch("/shop/", &token, json!({ "description": format!("{shop_name} goods") })).await;
        assert_eq!(status, StatusCode::OK, "{shop}");
        Seller { token, shop_slug: shop["slug"].as_str().unwrap().to_string(), shop_name: shop_name.to_string() }
    }

    /// Lists an item (creating a category first) and returns its slug.
    pub async fn list_item(&self, seller: &Seller, name: &str, price: f64) -> String {
        let (status, category) = self.post("/category/", &seller.token, Some(json!({ "name": format!("{name} category") }))).await;
        assert_eq!(status, StatusCode::OK, "{category}");
        let (status, item) = self.post("/item/", &seller.token, Some(json!({
            "category_id": category["id"],
            "name": name,
            "image": format!("{name}.png"),
            "title": name,
            "description": format!("A {name}"),
            "price": price,
        }))).await;
        assert_eq!(status, StatusCode::OK, "{item}");
        item["slug"].as_str().unwrap().to_string()
    }

    pub async fn wait_for_emails(&self, count: usize) -> Vec<Email> {
        for _ in 0..100 {
            if self.mailer.sent.lock().len() >= count { break; }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.mailer.sent.lock().clone()
    }
}

pub fn shipping() -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Buyer",
        "phone_number": "+15550100",
        "address": "1 Main Street",
        "country": "US",
        "city": "Springfield",
        "pin_code": "12345",
    })
}

/// Token query parameter of the first link in an email body.
pub fn token_in(email: &Email) -> String {
    let start = email.html.find("token=").map(|i| i + "token=".len()).unwrap();
    email.html[start..].chars().take_while(|c| *c != '\'' && *c != '"').collect()
}
