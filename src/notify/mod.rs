//! Notifications
//!
//! Services hand [`DomainEvent`]s to a [`Notifier`] after their writes are
//! committed. A background worker turns them into emails and, when a NATS
//! client is configured, publishes them on `marketplace.events.<kind>`.
//! Delivery failures are logged and never reach the request that raised the event.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::events::DomainEvent;

const SENDGRID_API: &str = "https://api.sendgrid.com/v3/mail/send";
const SUBJECT_PREFIX: &str = "marketplace.events";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(String),
    #[error("mail provider rejected message: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Writes emails to the log instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "Email not sent (no mail provider configured)");
        Ok(())
    }
}

pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl SendGridMailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), api_key: api_key.into(), from: from.into() }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let body = serde_json::json!({
            "personalizations": [{ "to": [{ "email": email.to }] }],
            "from": { "email": self.from },
            "subject": email.subject,
            "content": [{ "type": "text/html", "value": email.html }],
        });
        let response = self.client
            .post(SENDGRID_API)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected(format!("{status}: {text}")));
        }
        Ok(())
    }
}

/// Builds the email for an event, if the event has a recipient.
pub fn render(event: &DomainEvent, public_host: &str) -> Option<Email> {
    match event {
        DomainEvent::AccountRegistered { email, activation_token, .. } => Some(Email {
            to: email.clone(),
            subject: "Welcome to our shop!".into(),
            html: format!(
                "You have successfully registered to our shop. Please click \
                 <a href='{public_host}/verification/?token={activation_token}'>here</a> to activate your account."
            ),
        }),
        DomainEvent::NewsletterRequested { email, token } => Some(Email {
            to: email.clone(),
            subject: "Activate Your Subscription".into(),
            html: format!(
                "Click <a href='{public_host}/newsletter/verify/?token={token}'>here</a> to activate your subscription. \
                 You can leave any time <a href='{public_host}/newsletter/unsubscribe/?token={token}'>here</a>."
            ),
        }),
        DomainEvent::PasswordResetRequested { email, token } => Some(Email {
            to: email.clone(),
            subject: "Reset Your Password".into(),
            html: format!(
                "Click <a href='{public_host}/reset-password/verify/?token={token}'>here</a> to set a new password. \
                 The link is valid for 12 hours."
            ),
        }),
        DomainEvent::OrderPlaced { order_id, buyer_email, total_paid, shop_order_count } => Some(Email {
            to: buyer_email.clone(),
            subject: "Your order has been placed".into(),
            html: format!(
                "Thank you for your order {order_id}. Total paid: {total_paid}. \
                 It will be shipped by {shop_order_count} shop(s)."
            ),
        }),
        DomainEvent::ShopOrderStatusChanged { order_id, buyer_email, status, .. } => Some(Email {
            to: buyer_email.clone(),
            subject: "Your order status has changed".into(),
            html: format!("Part of your order {order_id} is now: {}.", status.as_str()),
        }),
        DomainEvent::PaymentConfirmed { .. } => None,
    }
}

/// Cheap handle for raising events; cloned into every service call.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<DomainEvent>,
}

impl Notifier {
    /// Starts the delivery worker on the current runtime.
    pub fn spawn(mailer: Arc<dyn Mailer>, nats: Option<async_nats::Client>, public_host: String) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(rx, mailer, nats, public_host));
        Self { tx }
    }

    pub fn send(&self, event: DomainEvent) {
        let kind = event.kind();
        if self.tx.send(event).is_err() {
            tracing::warn!(kind, "Notification worker stopped, event dropped");
        }
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<DomainEvent>,
    mailer: Arc<dyn Mailer>,
    nats: Option<async_nats::Client>,
    public_host: String,
) {
    while let Some(event) = rx.recv().await {
        if let Some(email) = render(&event, &public_host) {
            if let Err(e) = mailer.send(&email).await {
                tracing::error!(error = %e, to = %email.to, kind = event.kind(), "Failed to send email");
            }
        }
        if let Some(client) = &nats {
            publish(client, &event).await;
        }
    }
    tracing::debug!("Notification worker finished");
}

async fn publish(client: &async_nats::Client, event: &DomainEvent) {
    let subject = format!("{SUBJECT_PREFIX}.{}", event.kind());
    match serde_json::to_vec(event) {
        Ok(payload) => {
            if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                tracing::warn!(error = %e, %subject, "Failed to publish event");
            }
        }
        Err(e) => tracing::error!(error = %e, %subject, "Failed to encode event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::ShopOrderStatus;
    use crate::domain::value_objects::Money;
    use parking_lot::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Email>>);

    #[async_trait]
    impl Mailer for Recorder {
        async fn send(&self, email: &Email) -> Result<(), MailError> {
            self.0.lock().push(email.clone());
            Ok(())
        }
    }

    #[test]
    fn test_activation_link_uses_public_host() {
        let event = DomainEvent::AccountRegistered { user_id: Uuid::nil(), email: "a@b.io".into(), activation_token: "tok".into() };
        let email = render(&event, "http://shop.test").unwrap();
        assert_eq!(email.to, "a@b.io");
        assert!(email.html.contains("http://shop.test/verification/?token=tok"));
    }

    #[test]
    fn test_reset_link_points_at_verify_page() {
        let event = DomainEvent::PasswordResetRequested { email: "a@b.io".into(), token: "tok".into() };
        let email = render(&event, "http://shop.test").unwrap();
        assert_eq!(email.subject, "Reset Your Password");
        assert!(email.html.contains("http://shop.test/reset-password/verify/?token=tok"));
    }

    #[test]
    fn test_status_change_mentions_status() {
        let event = DomainEvent::ShopOrderStatusChanged {
            order_id: Uuid::nil(), shop_order_id: Uuid::nil(), buyer_email: "b@b.io".into(), status: ShopOrderStatus::Sent,
        };
        assert!(render(&event, "").unwrap().html.contains("Sent"));
        assert!(render(&DomainEvent::PaymentConfirmed { order_id: Uuid::nil(), shop_order_count: 1 }, "").is_none());
    }

    #[tokio::test]
    async fn test_worker_delivers_in_background() {
        let recorder = Arc::new(Recorder::default());
        let notifier = Notifier::spawn(recorder.clone(), None, "http://localhost".into());
        notifier.send(DomainEvent::OrderPlaced {
            order_id: Uuid::nil(), buyer_email: "c@b.io".into(), total_paid: Money::ZERO, shop_order_count: 2,
        });
        for _ in 0..50 {
            if !recorder.0.lock().is_empty() { break; }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(recorder.0.lock()[0].to, "c@b.io");
    }
}
