//! API configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use validator::Validate;

use vgen_provider::VeoConfig;
use vgen_reconciler::ReconcilerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Server and reconciler configuration, read once at start.
#[derive(Clone, Validate)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Bearer secret expected on the trigger route
    #[validate(length(min = 1))]
    pub shared_secret: String,
    /// Generation provider key
    #[validate(length(min = 1))]
    pub provider_api_key: String,
    /// Minutes before an active job is failed without polling
    #[validate(range(min = 1, max = 1440))]
    pub timeout_minutes: u64,
    /// Jobs polled per pass
    #[validate(range(min = 1, max = 100))]
    pub max_concurrent_polls: usize,
    /// Limit on each remote call, in seconds
    #[validate(range(min = 1, max = 600))]
    pub call_timeout_secs: u64,
    /// Internal schedule; `None` leaves passes to the external trigger
    pub reconcile_interval: Option<Duration>,
    /// Trigger route rate limit per client IP
    #[validate(range(min = 1))]
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Serve `/metrics`
    pub metrics_enabled: bool,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cors_origins", &self.cors_origins)
            .field("shared_secret", &"<redacted>")
            .field("provider_api_key", &"<redacted>")
            .field("timeout_minutes", &self.timeout_minutes)
            .field("max_concurrent_polls", &self.max_concurrent_polls)
            .field("call_timeout_secs", &self.call_timeout_secs)
            .field("reconcile_interval", &self.reconcile_interval)
            .field("rate_limit_rps", &self.rate_limit_rps)
            .field("max_body_size", &self.max_body_size)
            .field("environment", &self.environment)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

impl AppConfig {
    /// Defaults around the two required secrets.
    pub fn new(shared_secret: impl Into<String>, provider_api_key: impl Into<String>) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            shared_secret: shared_secret.into(),
            provider_api_key: provider_api_key.into(),
            timeout_minutes: 10,
            max_concurrent_polls: 5,
            call_timeout_secs: 60,
            reconcile_interval: None,
            rate_limit_rps: 10,
            max_body_size: 1024 * 1024,
            environment: "development".to_string(),
            metrics_enabled: true,
        }
    }

    /// Create config from environment variables.
    ///
    /// Call [`Validate::validate`] on the result before using it.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(
            required("CRON_SECRET")?,
            required("GEMINI_API_KEY")?,
        );

        if let Some(host) = optional("API_HOST") {
            config.host = host;
        }
        config.port = parse_or("API_PORT", config.port)?;
        if let Some(origins) = optional("CORS_ORIGINS") {
            config.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
        }
        config.timeout_minutes = parse_or("RECONCILE_TIMEOUT_MINUTES", config.timeout_minutes)?;
        config.max_concurrent_polls =
            parse_or("RECONCILE_MAX_CONCURRENT_POLLS", config.max_concurrent_polls)?;
        config.call_timeout_secs = parse_or("RECONCILE_CALL_TIMEOUT_SECS", config.call_timeout_secs)?;
        config.reconcile_interval = match parse_or("RECONCILE_INTERVAL_SECS", 0u64)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        config.rate_limit_rps = parse_or("RATE_LIMIT_RPS", config.rate_limit_rps)?;
        config.max_body_size = parse_or("MAX_BODY_SIZE", config.max_body_size)?;
        if let Some(environment) = optional("ENVIRONMENT") {
            config.environment = environment;
        }
        if let Some(enabled) = optional("METRICS_ENABLED") {
            config.metrics_enabled = enabled == "true" || enabled == "1";
        }

        Ok(config)
    }

    /// Read and validate in one step.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig::default()
            .with_timeout_minutes(self.timeout_minutes)
            .with_max_concurrent_polls(self.max_concurrent_polls)
            .with_remote_call_timeout(Duration::from_secs(self.call_timeout_secs))
    }

    /// Provider client settings keyed with the validated API key.
    pub fn provider_config(&self) -> VeoConfig {
        VeoConfig::with_env_overrides(self.provider_api_key.clone())
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key,
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "CRON_SECRET",
        "GEMINI_API_KEY",
        "API_PORT",
        "RECONCILE_TIMEOUT_MINUTES",
        "RECONCILE_MAX_CONCURRENT_POLLS",
        "RECONCILE_CALL_TIMEOUT_SECS",
        "RECONCILE_INTERVAL_SECS",
        "METRICS_ENABLED",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    fn set_required() {
        std::env::set_var("CRON_SECRET", "s3cret");
        std::env::set_var("GEMINI_API_KEY", "gm-key");
    }

    #[test]
    #[serial]
    fn test_defaults_from_env() {
        clear_env();
        set_required();

        let config = AppConfig::load().unwrap();
        assert_eq!(config.shared_secret, "s3cret");
        assert_eq!(config.timeout_minutes, 10);
        assert_eq!(config.max_concurrent_polls, 5);
        assert_eq!(config.reconcile_interval, None);
        assert_eq!(config.max_body_size, 1024 * 1024);
        assert!(config.metrics_enabled);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_secret() {
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "gm-key");

        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::Missing("CRON_SECRET"))
        ));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparseable_number() {
        clear_env();
        set_required();
        std::env::set_var("RECONCILE_TIMEOUT_MINUTES", "ten");

        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::Invalid {
                var: "RECONCILE_TIMEOUT_MINUTES",
                ..
            })
        ));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_out_of_range_values_fail_validation() {
        clear_env();
        set_required();
        std::env::set_var("RECONCILE_MAX_CONCURRENT_POLLS", "0");
        assert!(matches!(AppConfig::load(), Err(ConfigError::Validation(_))));

        std::env::set_var("RECONCILE_MAX_CONCURRENT_POLLS", "5");
        std::env::set_var("RECONCILE_TIMEOUT_MINUTES", "2000");
        assert!(matches!(AppConfig::load(), Err(ConfigError::Validation(_))));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_interval_and_overrides() {
        clear_env();
        set_required();
        std::env::set_var("RECONCILE_INTERVAL_SECS", "120");
        std::env::set_var("RECONCILE_CALL_TIMEOUT_SECS", "15");
        std::env::set_var("METRICS_ENABLED", "false");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.reconcile_interval, Some(Duration::from_secs(120)));
        assert!(!config.metrics_enabled);
        assert_eq!(
            config.reconciler_config().remote_call_timeout,
            Duration::from_secs(15)
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_provider_config_uses_loaded_key() {
        clear_env();
        set_required();

        let mut config = AppConfig::load().unwrap();
        assert_eq!(config.provider_config().api_key, "gm-key");

        // The environment is not consulted again for the key.
        std::env::set_var("GEMINI_API_KEY", "rotated-key");
        config.provider_api_key = "configured-key".to_string();
        assert_eq!(config.provider_config().api_key, "configured-key");

        clear_env();
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = AppConfig::new("s3cret", "gm-key");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("s3cret"));
        assert!(!printed.contains("gm-key"));
    }
}
