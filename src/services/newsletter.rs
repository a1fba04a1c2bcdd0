//! Newsletter double opt-in

use crate::auth::{JwtKeys, TokenKind};
use crate::domain::aggregates::Subscription;
use crate::domain::events::DomainEvent;
use crate::notify::Notifier;
use crate::store::Store;
use crate::{AppError, Result};

/// Records an inactive subscription (or reuses a cancelled one) and emails the confirmation link.
pub async fn sign_up(store: &dyn Store, jwt: &JwtKeys, notifier: &Notifier, email: &str) -> Result<Subscription> {
    let subscription = match store.subscription_by_email(email).await? {
        Some(existing) if existing.is_active => {
            return Err(AppError::conflict("Email is already signed for newsletter."));
        }
        Some(existing) => existing,
        None => {
            let subscription = Subscription::request(email);
            store.save_subscription(&subscription).await?;
            subscription
        }
    };
    let token = jwt.issue(TokenKind::Newsletter, &subscription.email)?;
    notifier.send(DomainEvent::NewsletterRequested { email: subscription.email.clone(), token });
    Ok(subscription)
}

async fn subscription_for_token(store: &dyn Store, jwt: &JwtKeys, token: &str) -> Result<Subscription> {
    let email = jwt.verify(token, TokenKind::Newsletter)?;
    store.subscription_by_email(&email).await?.ok_or_else(|| AppError::not_found("Subscription"))
}

pub async fn verify(store: &dyn Store, jwt: &JwtKeys, token: &str) -> Result<Subscription> {
    let mut subscription = subscription_for_token(store, jwt, token).await?;
    subscription.activate()?;
    store.save_subscription(&subscription).await?;
    Ok(subscription)
}

pub async fn unsubscribe(store: &dyn Store, jwt: &JwtKeys, token: &str) -> Result<Subscription> {
    let mut subscription = subscription_for_token(store, jwt, token).await?;
    subscription.cancel()?;
    store.save_subscription(&subscription).await?;
    Ok(subscription)
}
