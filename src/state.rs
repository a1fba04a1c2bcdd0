//! Shared application state

use std::sync::Arc;

use crate::auth::JwtKeys;
use crate::config::Config;
use crate::notify::Notifier;
use crate::payment::PaymentGateway;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub payments: Arc<dyn PaymentGateway>,
    pub notifier: Notifier,
    pub jwt: JwtKeys,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        payments: Arc<dyn PaymentGateway>,
        notifier: Notifier,
    ) -> Self {
        let jwt = JwtKeys::new(&config.jwt_secret, config.access_token_expire_minutes);
        Self { store, payments, notifier, jwt, config: Arc::new(config) }
    }
}
