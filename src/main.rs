//! Marketplace API server

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketplace::config::Config;
use marketplace::notify::{LogMailer, Mailer, Notifier, SendGridMailer};
use marketplace::payment::{LocalGateway, PaymentGateway, StripeGateway};
use marketplace::state::AppState;
use marketplace::store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            let store = PgStore::new(pool);
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let payments: Arc<dyn PaymentGateway> = match &config.stripe_secret_key {
        Some(key) => Arc::new(StripeGateway::new(key.clone(), config.payment_timeout)?),
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set, payments are approved locally");
            Arc::new(LocalGateway)
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.sendgrid_api_key {
        Some(key) => Arc::new(SendGridMailer::new(key.clone(), config.from_email.clone())),
        None => Arc::new(LogMailer),
    };

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, events will not be published");
                None
            }
        },
        None => None,
    };

    let notifier = Notifier::spawn(mailer, nats, config.public_host.clone());
    let port = config.port;
    let app = marketplace::api::router(AppState::new(config, store, payments, notifier));

    tracing::info!("Marketplace listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}
