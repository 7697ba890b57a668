//! Transport to the metrics webhook
//!
//! [`MetricsWebhook`] is the seam between the controller and the outside
//! world. [`HttpWebhook`] talks to the real endpoint; the in-memory
//! [`MetricsSimulator`](crate::simulator::MetricsSimulator) and test doubles
//! implement the same trait.

#![forbid(unsafe_code)]

use crate::{
    config::{DashboardConfig, RefreshMethod},
    error::Result,
    wire::{SubmissionPayload, WebhookResponse},
};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use url::Url;

/// The remote endpoint acting as the dashboard's only backend
///
/// Implementations only move bytes: they return the raw status and body and
/// leave success/failure interpretation to [`crate::wire`]. Transport
/// failures (connection refused, timeout) are reported as errors.
#[async_trait]
pub trait MetricsWebhook: Send + Sync {
    /// POST a payment submission
    async fn submit(&self, payload: &SubmissionPayload) -> Result<WebhookResponse>;

    /// Fetch the current metrics
    async fn fetch_metrics(&self) -> Result<WebhookResponse>;
}

#[async_trait]
impl<T> MetricsWebhook for Arc<T>
where
    T: MetricsWebhook + ?Sized,
{
    async fn submit(&self, payload: &SubmissionPayload) -> Result<WebhookResponse> {
        (**self).submit(payload).await
    }

    async fn fetch_metrics(&self) -> Result<WebhookResponse> {
        (**self).fetch_metrics().await
    }
}

/// reqwest-backed webhook client
#[derive(Debug, Clone)]
pub struct HttpWebhook {
    client: reqwest::Client,
    submit_url: Url,
    metrics_url: Url,
    refresh_method: RefreshMethod,
}

impl HttpWebhook {
    /// Build a client from the dashboard configuration
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout)
            .user_agent(concat!("fluxpay-sdk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(
            service = "fluxpay-sdk",
            component = "http_webhook",
            event = "client_created",
            submit_url = %config.webhook_url,
            metrics_url = %config.refresh_url(),
            timeout_ms = u64::try_from(config.request_timeout.as_millis()).unwrap_or(u64::MAX),
            "HTTP webhook client initialized"
        );

        Ok(Self {
            client,
            submit_url: config.webhook_url.clone(),
            metrics_url: config.refresh_url().clone(),
            refresh_method: config.refresh_method,
        })
    }

    #[must_use]
    pub const fn submit_url(&self) -> &Url {
        &self.submit_url
    }

    #[must_use]
    pub const fn metrics_url(&self) -> &Url {
        &self.metrics_url
    }

    async fn read(response: reqwest::Response) -> Result<WebhookResponse> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(
            service = "fluxpay-sdk",
            component = "http_webhook",
            event = "response_received",
            status,
            body_len = body.len(),
        );
        Ok(WebhookResponse { status, body })
    }
}

#[async_trait]
impl MetricsWebhook for HttpWebhook {
    #[instrument(skip_all, fields(url = %self.submit_url))]
    async fn submit(&self, payload: &SubmissionPayload) -> Result<WebhookResponse> {
        debug!(
            phone_digits = payload.telefone.len(),
            product = payload.produto.as_deref().unwrap_or("-"),
            plan = payload.plano.as_deref().unwrap_or("-"),
            amount = payload.valor,
            "Posting submission"
        );
        let response = self
            .client
            .post(self.submit_url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(payload)
            .send()
            .await?;
        Self::read(response).await
    }

    #[instrument(skip_all, fields(url = %self.metrics_url))]
    async fn fetch_metrics(&self) -> Result<WebhookResponse> {
        let request = match self.refresh_method {
            RefreshMethod::Get => self.client.get(self.metrics_url.clone()),
            RefreshMethod::Post => self
                .client
                .post(self.metrics_url.clone())
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body("{}"),
        };
        let response = request
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;
        Self::read(response).await
    }
}
