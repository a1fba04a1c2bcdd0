//! Signup, login, activation and the user endpoints

use axum::extract::{Path, Query, State};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use super::extract::ValidatedJson;
use crate::auth::CurrentUser;
use crate::domain::aggregates::{Role, User};
use crate::services::accounts::{self, ProfileChanges, Registration};
use crate::state::AppState;
use crate::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub shop_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequestQuery {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewPasswordRequest {
    #[validate(length(min = 6))]
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UserPatchRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub username: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
}

pub async fn signup(State(state): State<AppState>, ValidatedJson(req): ValidatedJson<SignupRequest>) -> Result<Json<User>> {
    let registration = Registration {
        first_name: req.first_name,
        last_name: req.last_name,
        username: req.username,
        email: req.email.trim().to_lowercase(),
        password: req.password,
        role: req.role,
        shop_name: req.shop_name,
    };
    let user = accounts::register(state.store.as_ref(), &state.jwt, &state.notifier, registration).await?;
    Ok(Json(user))
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Json<Value>> {
    let email = form.username.trim().to_lowercase();
    let token = accounts::login(state.store.as_ref(), &state.jwt, &email, &form.password).await?;
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

pub async fn verify_email(State(state): State<AppState>, Query(q): Query<TokenQuery>) -> Result<Json<Value>> {
    let detail = if accounts::activate(state.store.as_ref(), &state.jwt, &q.token).await? {
        "Your account successfully activated."
    } else {
        "Your account already activated."
    };
    Ok(Json(json!({ "detail": detail })))
}

// Password reset

pub async fn reset_password_form() -> Json<Value> {
    Json(json!({ "message": "Please provide email address" }))
}

pub async fn request_password_reset(State(state): State<AppState>, Query(q): Query<ResetRequestQuery>) -> Result<Json<Value>> {
    q.validate()?;
    let email = q.email.trim().to_lowercase();
    accounts::request_password_reset(state.store.as_ref(), &state.jwt, &state.notifier, &email).await?;
    Ok(Json(json!({ "message": format!("Link to reset password has been sent to {email}") })))
}

pub async fn verify_reset_token(State(state): State<AppState>, Query(q): Query<TokenQuery>) -> Result<Json<Value>> {
    accounts::password_reset_user(state.store.as_ref(), &state.jwt, &q.token).await?;
    Ok(Json(json!({ "message": "Please provide new password." })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Query(q): Query<TokenQuery>,
    ValidatedJson(req): ValidatedJson<NewPasswordRequest>,
) -> Result<Json<Value>> {
    accounts::reset_password(state.store.as_ref(), &state.jwt, &q.token, &req.new_password).await?;
    Ok(Json(json!({ "detail": "Password has been changed." })))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

pub async fn get_user(State(state): State<AppState>, Path(raw_id): Path<String>) -> Result<Json<User>> {
    let user_id = Uuid::parse_str(&raw_id).map_err(|_| AppError::not_found("User"))?;
    Ok(Json(accounts::get_user(state.store.as_ref(), user_id).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(req): ValidatedJson<UserPatchRequest>,
) -> Result<Json<User>> {
    let changes = ProfileChanges {
        first_name: req.first_name,
        last_name: req.last_name,
        username: req.username,
        password: req.password,
    };
    Ok(Json(accounts::update_profile(state.store.as_ref(), user, changes).await?))
}

pub async fn delete_user(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Value>> {
    accounts::delete_account(state.store.as_ref(), user.id).await?;
    Ok(Json(json!({ "message": "User deleted successfully." })))
}
