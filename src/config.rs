//! Service configuration

use std::time::Duration;

use anyhow::{bail, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL; the in-memory store is used when unset
    pub database_url: Option<String>,
    pub port: u16,
    /// development | staging | production
    pub environment: String,
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    /// No key means every payment is approved locally
    pub stripe_secret_key: Option<String>,
    /// Webhook signatures are only checked when this is set
    pub stripe_webhook_secret: Option<String>,
    pub payment_currency: String,
    pub payment_timeout: Duration,
    pub sendgrid_api_key: Option<String>,
    pub from_email: String,
    /// Base URL used in emailed links
    pub public_host: String,
    pub nats_url: Option<String>,
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String> {
        match optional(name) {
            Some(value) => Ok(value),
            None if environment == "development" => Ok(format!("dev-{name}-not-for-production")),
            None => bail!("{name} must be set in {environment} environment"),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let port = parsed("PORT", 8083);

        let stripe_secret_key = optional("STRIPE_SECRET_KEY");
        let stripe_webhook_secret = optional("STRIPE_WEBHOOK_SECRET");
        if environment != "development" && (stripe_secret_key.is_none() || stripe_webhook_secret.is_none()) {
            bail!("STRIPE_SECRET_KEY and STRIPE_WEBHOOK_SECRET must be set in {environment} environment");
        }

        Ok(Self {
            database_url: optional("DATABASE_URL"),
            port,
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            access_token_expire_minutes: parsed("ACCESS_TOKEN_EXPIRE_MINUTES", 60 * 24 * 8),
            stripe_secret_key,
            stripe_webhook_secret,
            payment_currency: std::env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "usd".into()),
            payment_timeout: Duration::from_secs(parsed("PAYMENT_TIMEOUT_SECS", 10)),
            sendgrid_api_key: optional("SENDGRID_API_KEY"),
            from_email: std::env::var("FROM_EMAIL").unwrap_or_else(|_| "noreply@localhost".into()),
            public_host: std::env::var("PUBLIC_HOST").unwrap_or_else(|_| format!("http://localhost:{port}")),
            nats_url: optional("NATS_URL"),
            environment,
        })
    }

    /// Settings for tests and local runs: in-memory store, local payments, no mail.
    pub fn development() -> Self {
        Self {
            database_url: None,
            port: 8083,
            environment: "development".into(),
            jwt_secret: "dev-JWT_SECRET-not-for-production".into(),
            access_token_expire_minutes: 60 * 24 * 8,
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            payment_currency: "usd".into(),
            payment_timeout: Duration::from_secs(10),
            sendgrid_api_key: None,
            from_email: "noreply@localhost".into(),
            public_host: "http://localhost:8083".into(),
            nats_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let config = Config::development();
        assert_eq!(config.port, 8083);
        assert_eq!(config.payment_currency, "usd");
        assert!(config.stripe_secret_key.is_none());
    }

    #[test]
    fn test_secret_required_outside_development() {
        assert!(Config::require_secret("MARKETPLACE_TEST_UNSET_SECRET", "production").is_err());
        assert!(Config::require_secret("MARKETPLACE_TEST_UNSET_SECRET", "development").is_ok());
    }
}
