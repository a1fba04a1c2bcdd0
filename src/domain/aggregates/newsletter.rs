//! Newsletter subscription

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// New subscriptions stay inactive until the emailed link is followed.
    pub fn request(email: impl Into<String>) -> Self {
        Self { id: Uuid::now_v7(), email: email.into(), is_active: false, created_at: Utc::now() }
    }

    pub fn activate(&mut self) -> Result<(), SubscriptionError> {
        if self.is_active { return Err(SubscriptionError::AlreadyActive); }
        self.is_active = true;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), SubscriptionError> {
        if !self.is_active { return Err(SubscriptionError::NotSubscribed); }
        self.is_active = false;
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SubscriptionError {
    #[error("Your email already activated.")]
    AlreadyActive,
    #[error("You are not subscribed for a newsletter.")]
    NotSubscribed,
}
