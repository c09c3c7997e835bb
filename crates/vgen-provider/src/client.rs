//! Veo operations client.

use std::time::Duration;

use reqwest::{Client, Response, Url};
use tracing::{debug, info, warn};

use vgen_models::PollOutcome;

use crate::error::{ProviderError, ProviderResult};
use crate::types::Operation;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Provider client configuration.
#[derive(Debug, Clone)]
pub struct VeoConfig {
    /// Gemini API key
    pub api_key: String,
    /// API root, overridable for tests
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl VeoConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::config_error("GEMINI_API_KEY not set"))?;

        Ok(Self::with_env_overrides(api_key))
    }

    /// Use a key supplied by the caller; base URL and timeout still come
    /// from the environment when set.
    pub fn with_env_overrides(api_key: impl Into<String>) -> Self {
        let mut config = Self::new(api_key);
        if let Ok(base) = std::env::var("VEO_API_BASE_URL") {
            config.base_url = base;
        }
        if let Some(secs) = std::env::var("VEO_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

/// Client for polling generation operations and downloading results.
#[derive(Clone)]
pub struct VeoClient {
    http: Client,
    api_key: String,
    base_url: Url,
}

impl VeoClient {
    pub fn new(config: VeoConfig) -> ProviderResult<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ProviderError::config_error(format!("invalid base URL: {}", e)))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("vgen-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key,
            base_url,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(VeoConfig::from_env()?)
    }

    /// Fetch the operation and report its state.
    pub async fn poll_operation(&self, operation_ref: &str) -> ProviderResult<PollOutcome> {
        let url = self.operation_url(operation_ref)?;
        debug!(operation = operation_ref, "Polling generation operation");

        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body = response.text().await?;
        let operation: Operation = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!(
                "operation {}: {} (body prefix: {})",
                operation_ref,
                e,
                body.chars().take(200).collect::<String>()
            ))
        })?;

        let outcome = operation.to_outcome();
        match &outcome {
            PollOutcome::Failed { message } => {
                warn!(operation = operation_ref, "Generation failed: {}", message)
            }
            PollOutcome::Succeeded { .. } => {
                info!(operation = operation_ref, "Generation finished")
            }
            PollOutcome::Pending => {}
        }
        Ok(outcome)
    }

    /// Download the finished video.
    ///
    /// The API key is only attached for hosts under the provider's domain;
    /// redirects to signed storage URLs are followed without it.
    pub async fn fetch_result_bytes(&self, location: &str) -> ProviderResult<Vec<u8>> {
        let url = resolve_location(location)?;
        let mut request = self.http.get(url.clone());
        if self.is_provider_host(&url) {
            request = request.header(API_KEY_HEADER, &self.api_key);
        }

        let response = check_status(request.send().await?).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::invalid_response(format!(
                "empty result body from {}",
                url
            )));
        }

        debug!(bytes = bytes.len(), "Downloaded generated video");
        Ok(bytes.to_vec())
    }

    fn operation_url(&self, operation_ref: &str) -> ProviderResult<Url> {
        let path = operation_ref.trim().trim_start_matches('/');
        let valid = !path.is_empty()
            && path.contains("operations/")
            && !path.split('/').any(|seg| seg.is_empty() || seg == "..");
        if !valid {
            return Err(ProviderError::InvalidOperationRef(operation_ref.to_string()));
        }

        Url::parse(&format!("{}/v1beta/{}", self.base_url.as_str().trim_end_matches('/'), path))
            .map_err(|_| ProviderError::InvalidOperationRef(operation_ref.to_string()))
    }

    fn is_provider_host(&self, url: &Url) -> bool {
        match (url.host_str(), self.base_url.host_str()) {
            (Some(host), Some(base)) => host == base || host.ends_with(".googleapis.com"),
            _ => false,
        }
    }
}

/// Turn a provider-reported location into a fetchable URL.
///
/// `gs://bucket/path` is served through the public storage endpoint.
pub(crate) fn resolve_location(location: &str) -> ProviderResult<Url> {
    let location = location.trim();
    let candidate = match location.strip_prefix("gs://") {
        Some(rest) => format!("https://storage.googleapis.com/{}", rest),
        None => location.to_string(),
    };

    let url = Url::parse(&candidate)
        .map_err(|_| ProviderError::InvalidLocation(location.to_string()))?;
    match url.scheme() {
        "https" | "http" => Ok(url),
        _ => Err(ProviderError::InvalidLocation(location.to_string())),
    }
}

async fn check_status(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body: body.chars().take(500).collect(),
    })
}
