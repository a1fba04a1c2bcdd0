//! Request extractors for authenticated users and shop owners

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use super::TokenKind;
use crate::domain::aggregates::{Shop, User};
use crate::state::AppState;
use crate::AppError;

/// The user named by the request's bearer token.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// A user whose role is `SHOP`, together with the shop they own.
#[derive(Clone, Debug)]
pub struct CurrentShop {
    pub user: User,
    pub shop: Shop,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(AppError::credentials)?;

        let sub = state.jwt.verify(token, TokenKind::AccessToken)?;
        let user_id = Uuid::parse_str(&sub).map_err(|_| AppError::credentials())?;
        let user = state.store.user_by_id(user_id).await?.ok_or_else(AppError::credentials)?;

        let current = CurrentUser(user);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentShop {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_shop() {
            return Err(AppError::Forbidden("User is not a shop.".into()));
        }
        let shop = state.store.shop_by_owner(user.id).await?.ok_or_else(|| AppError::not_found("Shop"))?;
        Ok(CurrentShop { user, shop })
    }
}
