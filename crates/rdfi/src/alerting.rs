//! Failure fan-out to alerting sinks.
//!
//! Per-shard errors never abort the scheduler loop; they are pushed out
//! through every configured alerter instead.

use async_trait::async_trait;
use tracing::{error, warn};

use gateway_core::{AlerterConfig, Error, ErrorsConfig, Result};

/// One alerting sink.
#[async_trait]
pub trait Alerter: Send + Sync {
    fn kind(&self) -> &'static str;
    async fn alert(&self, err: &Error) -> Result<()>;
}

/// Structured-log sink. Always available.
pub struct LogAlerter;

#[async_trait]
impl Alerter for LogAlerter {
    fn kind(&self) -> &'static str {
        "log"
    }

    async fn alert(&self, err: &Error) -> Result<()> {
        error!(error = %err, "alert");
        Ok(())
    }
}

/// Slack-style webhook sink.
pub struct WebhookAlerter {
    url: String,
    client: reqwest::Client,
}

impl WebhookAlerter {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(Error::config("webhook alerter requires a url"));
        }
        Ok(Self {
            url,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .map_err(|e| Error::config(format!("webhook alerter client: {e}")))?,
        })
    }
}

#[async_trait]
impl Alerter for WebhookAlerter {
    fn kind(&self) -> &'static str {
        "webhook"
    }

    async fn alert(&self, err: &Error) -> Result<()> {
        let body = serde_json::json!({
            "text": format!("ach-gateway: {err}"),
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::internal(format!("webhook alert failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::internal(format!(
                "webhook alert returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Every configured sink; alerts fan out to all of them.
#[derive(Default)]
pub struct Alerters(Vec<Box<dyn Alerter>>);

impl Alerters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &ErrorsConfig) -> Result<Self> {
        let mut alerters = Self::new();
        for sink in &cfg.alerters {
            match sink {
                AlerterConfig::Log => alerters.push(Box::new(LogAlerter)),
                AlerterConfig::Webhook { url } => {
                    alerters.push(Box::new(WebhookAlerter::new(url.clone())?))
                }
            }
        }
        Ok(alerters)
    }

    pub fn push(&mut self, alerter: Box<dyn Alerter>) {
        self.0.push(alerter);
    }

    /// Sends `err` to every sink. A failing sink is logged, never fatal.
    pub async fn alert_error(&self, err: &Error) {
        for alerter in &self.0 {
            if let Err(send_err) = alerter.alert(err).await {
                warn!(kind = alerter.kind(), error = %send_err, "Failed to send alert");
            }
        }
    }
}
