//! Newsletter endpoints

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use super::accounts::TokenQuery;
use super::extract::ValidatedJson;
use crate::domain::aggregates::Subscription;
use crate::services::newsletter;
use crate::state::AppState;
use crate::Result;

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewsletterRequest {
    #[validate(email)]
    pub email: String,
}

pub async fn sign_up(State(state): State<AppState>, ValidatedJson(req): ValidatedJson<NewsletterRequest>) -> Result<Json<Subscription>> {
    let email = req.email.trim().to_lowercase();
    Ok(Json(newsletter::sign_up(state.store.as_ref(), &state.jwt, &state.notifier, &email).await?))
}

pub async fn verify(State(state): State<AppState>, Query(q): Query<TokenQuery>) -> Result<Json<Value>> {
    newsletter::verify(state.store.as_ref(), &state.jwt, &q.token).await?;
    Ok(Json(json!({ "detail": "Email is successfully verified." })))
}

pub async fn unsubscribe(State(state): State<AppState>, Query(q): Query<TokenQuery>) -> Result<Json<Value>> {
    newsletter::unsubscribe(state.store.as_ref(), &state.jwt, &q.token).await?;
    Ok(Json(json!({ "detail": "You are successfully unsubscribed." })))
}
