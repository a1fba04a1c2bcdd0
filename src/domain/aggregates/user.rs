//! User Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user is either a regular customer or the owner of exactly one shop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Customer,
    Shop,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Customer => "CUSTOMER", Self::Shop => "SHOP" }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value { "CUSTOMER" => Some(Self::Customer), "SHOP" => Some(Self::Shop), _ => None }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    #[serde(skip)]
    pub is_active: bool,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn register(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: String,
        role: Role,
    ) -> Self {
        Self {
            id: Uuid::now_v7(), first_name: first_name.into(), last_name: last_name.into(),
            username: username.into(), email: email.into(), password_hash, role,
            is_active: false, created_at: Utc::now(),
        }
    }

    pub fn is_shop(&self) -> bool { self.role == Role::Shop }

    /// Returns `false` when the account was already active.
    pub fn activate(&mut self) -> bool {
        if self.is_active { return false; }
        self.is_active = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        assert_eq!(Role::parse(Role::Shop.as_str()), Some(Role::Shop));
        assert_eq!(Role::parse("ADMIN"), None);
    }

    #[test]
    fn test_activate_once() {
        let mut user = User::register("Ada", "Lovelace", "ada", "ada@example.com", "hash".into(), Role::Customer);
        assert!(!user.is_active);
        assert!(user.activate());
        assert!(!user.activate());
    }
}
