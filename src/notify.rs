//! Lead notifications.
//!
//! New applications and orders are forwarded to the bot service as
//! `POST {BOT_WEBHOOK_URL}/webhook/{application|order}`. Delivery happens on a
//! detached task after the record is stored; failures are logged and dropped.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::WebhookConfig;
use crate::db::models::{Application, Order};
use crate::db::Resource;

pub const SECRET_HEADER: &str = "X-Webhook-Secret";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook URL is not configured")]
    NotConfigured,
    #[error("failed to serialize lead: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook responded with status {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadKind {
    Application,
    Order,
}

impl LeadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Order => "order",
        }
    }
}

/// A stored lead that triggers a notification.
pub trait Lead: Resource {
    const KIND: LeadKind;
}

impl Lead for Application {
    const KIND: LeadKind = LeadKind::Application;
}

impl Lead for Order {
    const KIND: LeadKind = LeadKind::Order;
}

/// Webhook body: the stored record plus a `timestamp`.
#[derive(Debug, Clone)]
pub struct LeadEvent {
    pub kind: LeadKind,
    pub payload: Value,
}

impl LeadEvent {
    pub fn new<R: Serialize>(kind: LeadKind, record: &R) -> Result<Self, NotifyError> {
        let mut payload = serde_json::to_value(record)?;
        if let Value::Object(map) = &mut payload {
            map.insert(
                "timestamp".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        Ok(Self { kind, payload })
    }

    pub fn from_lead<R: Lead>(record: &R) -> Result<Self, NotifyError> {
        Self::new(R::KIND, record)
    }
}

/// Fire-and-forget delivery. Implementations must not block the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: LeadEvent);
}

#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    config: Arc<WebhookConfig>,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: Arc::new(config),
        }
    }

    /// Both the URL and the shared secret are required.
    pub fn is_configured(&self) -> bool {
        self.config.url.is_some() && !self.config.secret.is_empty()
    }

    fn endpoint(&self, kind: LeadKind) -> Option<String> {
        if !self.is_configured() {
            return None;
        }
        self.config
            .url
            .as_ref()
            .map(|base| format!("{}/webhook/{}", base.trim_end_matches('/'), kind.as_str()))
    }

    /// Send one event and wait for the response.
    pub async fn deliver(&self, event: &LeadEvent) -> Result<(), NotifyError> {
        let url = self.endpoint(event.kind).ok_or(NotifyError::NotConfigured)?;

        let response = self
            .client
            .post(&url)
            .header(SECRET_HEADER, &self.config.secret)
            .json(&event.payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }

        tracing::debug!(kind = event.kind.as_str(), %url, "Lead notification delivered");
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, event: LeadEvent) {
        if !self.is_configured() {
            tracing::debug!(
                kind = event.kind.as_str(),
                "Bot webhook not configured, skipping lead notification"
            );
            return;
        }

        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.deliver(&event).await {
                tracing::warn!(kind = event.kind.as_str(), error = %e, "Lead notification failed");
            }
        });
    }
}
