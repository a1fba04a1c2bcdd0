//! Accounts: signup, login, activation and profile changes

use uuid::Uuid;

use super::unique_slug;
use crate::auth::{hash_password, verify_password, JwtKeys, TokenKind};
use crate::domain::aggregates::{Role, Shop, User};
use crate::domain::events::DomainEvent;
use crate::domain::patch::FieldDiff;
use crate::domain::value_objects::Slug;
use crate::notify::Notifier;
use crate::store::{SlugScope, Store};
use crate::{AppError, Result};

#[derive(Clone, Debug)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub shop_name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

async fn ensure_free_username(store: &dyn Store, username: &str) -> Result<()> {
    if store.user_by_username(username).await?.is_some() {
        return Err(AppError::conflict("Username is already taken."));
    }
    Ok(())
}

/// Creates the user (and their shop for the `SHOP` role) inactive and emails an activation link.
pub async fn register(store: &dyn Store, jwt: &JwtKeys, notifier: &Notifier, registration: Registration) -> Result<User> {
    if store.user_by_email(&registration.email).await?.is_some() {
        return Err(AppError::conflict("Email is already taken."));
    }
    ensure_free_username(store, &registration.username).await?;

    let shop_name = match (registration.role, registration.shop_name.as_deref().map(str::trim)) {
        (Role::Shop, Some(name)) if !name.is_empty() => {
            if store.shop_by_name(name).await?.is_some() {
                return Err(AppError::conflict("Shop name is already taken."));
            }
            Some(name.to_string())
        }
        (Role::Shop, _) => return Err(AppError::BadRequest("Shop name is required.".into())),
        (Role::Customer, _) => None,
    };

    let user = User::register(
        registration.first_name,
        registration.last_name,
        registration.username,
        registration.email,
        hash_password(&registration.password)?,
        registration.role,
    );
    let shop = match shop_name {
        Some(name) => {
            let slug = unique_slug(store, SlugScope::Shop, Slug::from_text(&name)?).await?;
            Some(Shop::open(user.id, name, slug))
        }
        None => None,
    };
    store.create_user(&user, shop.as_ref()).await?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered");

    let activation_token = jwt.issue(TokenKind::Activation, &user.id.to_string())?;
    notifier.send(DomainEvent::AccountRegistered { user_id: user.id, email: user.email.clone(), activation_token });
    Ok(user)
}

/// Returns an access token for valid credentials.
pub async fn login(store: &dyn Store, jwt: &JwtKeys, email: &str, password: &str) -> Result<String> {
    let incorrect = || AppError::BadRequest("Incorrect credentials.".into());
    let user = store.user_by_email(email).await?.ok_or_else(incorrect)?;
    if !verify_password(password, &user.password_hash) {
        return Err(incorrect());
    }
    jwt.issue(TokenKind::AccessToken, &user.id.to_string())
}

async fn token_user(store: &dyn Store, jwt: &JwtKeys, token: &str, kind: TokenKind) -> Result<User> {
    let sub = jwt.verify(token, kind)?;
    let user_id = Uuid::parse_str(&sub).map_err(|_| AppError::Unauthorized("Invalid token.".into()))?;
    get_user(store, user_id).await
}

/// Activates the account named by an activation token. Returns `false` if it was already active.
pub async fn activate(store: &dyn Store, jwt: &JwtKeys, token: &str) -> Result<bool> {
    let mut user = token_user(store, jwt, token, TokenKind::Activation).await?;
    if !user.activate() {
        return Ok(false);
    }
    store.update_user(&user).await?;
    tracing::info!(user_id = %user.id, "Account activated");
    Ok(true)
}

/// Emails a reset link if an account uses `email`. Unknown addresses get the same answer and no mail.
pub async fn request_password_reset(store: &dyn Store, jwt: &JwtKeys, notifier: &Notifier, email: &str) -> Result<()> {
    let Some(user) = store.user_by_email(email).await? else {
        tracing::debug!("Password reset requested for an unknown email");
        return Ok(());
    };
    let token = jwt.issue(TokenKind::PasswordReset, &user.id.to_string())?;
    notifier.send(DomainEvent::PasswordResetRequested { email: user.email, token });
    tracing::info!(user_id = %user.id, "Password reset requested");
    Ok(())
}

/// The account a reset token was issued for.
pub async fn password_reset_user(store: &dyn Store, jwt: &JwtKeys, token: &str) -> Result<User> {
    token_user(store, jwt, token, TokenKind::PasswordReset).await
}

pub async fn reset_password(store: &dyn Store, jwt: &JwtKeys, token: &str, new_password: &str) -> Result<()> {
    let mut user = password_reset_user(store, jwt, token).await?;
    user.password_hash = hash_password(new_password)?;
    store.update_user(&user).await?;
    tracing::info!(user_id = %user.id, "Password reset");
    Ok(())
}

pub async fn get_user(store: &dyn Store, user_id: Uuid) -> Result<User> {
    store.user_by_id(user_id).await?.ok_or_else(|| AppError::not_found("User"))
}

pub async fn update_profile(store: &dyn Store, mut user: User, changes: ProfileChanges) -> Result<User> {
    let mut diff = FieldDiff::new();
    if FieldDiff::differs(&user.username, changes.username.as_ref()) {
        if let Some(username) = changes.username.as_deref() {
            ensure_free_username(store, username).await?;
        }
    }
    diff.apply(&mut user.username, changes.username);
    diff.apply(&mut user.first_name, changes.first_name);
    diff.apply(&mut user.last_name, changes.last_name);
    if let Some(password) = changes.password {
        if !verify_password(&password, &user.password_hash) {
            user.password_hash = hash_password(&password)?;
            diff.record();
        }
    }
    diff.finish()?;
    store.update_user(&user).await?;
    Ok(user)
}

pub async fn delete_account(store: &dyn Store, user_id: Uuid) -> Result<()> {
    if !store.delete_user(user_id).await? {
        return Err(AppError::not_found("User"));
    }
    tracing::info!(%user_id, "User deleted");
    Ok(())
}
