//! Resend email API client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vgen_models::OwnerId;

use crate::error::{NotifyError, NotifyResult};
use crate::template::completion_email;

const DEFAULT_BASE_URL: &str = "https://api.resend.com";
const DEFAULT_FROM: &str = "noreply@lifeisshort.com";
const DEFAULT_SUBJECT: &str = "Life Is Short - your video is ready!";
const DEFAULT_APP_URL: &str = "https://lifeisshort.com";

/// Email client configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_key: String,
    pub base_url: String,
    /// Sender address
    pub from: String,
    pub subject: String,
    /// Public app root used in links
    pub app_url: String,
    pub timeout: Duration,
}

impl EmailConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            from: DEFAULT_FROM.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            app_url: DEFAULT_APP_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> NotifyResult<Self> {
        let api_key = std::env::var("RESEND_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| NotifyError::config_error("RESEND_API_KEY not set"))?;

        let mut config = Self::new(api_key);
        let overrides = [
            ("RESEND_API_BASE_URL", &mut config.base_url),
            ("NOTIFY_FROM", &mut config.from),
            ("NOTIFY_SUBJECT", &mut config.subject),
            ("APP_URL", &mut config.app_url),
        ];
        for (key, field) in overrides {
            if let Some(value) = std::env::var(key).ok().filter(|v| !v.trim().is_empty()) {
                *field = value;
            }
        }
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

/// Sends completion notices.
#[derive(Clone)]
pub struct EmailClient {
    http: Client,
    config: EmailConfig,
}

impl EmailClient {
    pub fn new(config: EmailConfig) -> NotifyResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("vgen-notify/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> NotifyResult<Self> {
        Self::new(EmailConfig::from_env()?)
    }

    /// Tell the owner their video is ready.
    pub async fn send_completion_notice(&self, address: &str, owner_id: &OwnerId) -> NotifyResult<()> {
        let address = address.trim();
        if address.is_empty() || !address.contains('@') {
            return Err(NotifyError::InvalidRecipient(address.to_string()));
        }

        let email = completion_email(&self.config.app_url, &self.config.subject, owner_id);
        let request = SendEmailRequest {
            from: &self.config.from,
            to: vec![address],
            subject: &email.subject,
            html: &email.html,
        };

        let url = format!("{}/emails", self.config.base_url.trim_end_matches('/'));
        debug!(owner_id = %owner_id, "Sending completion email");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let sent: SendEmailResponse = response.json().await.unwrap_or(SendEmailResponse { id: None });
        info!(owner_id = %owner_id, email_id = ?sent.id, "Completion email sent");
        Ok(())
    }
}
