use std::time::Duration;

use crate::errors::{FCMError, Result};

/// Production FCM API host
pub const DEFAULT_API_BASE_URL: &str = "https://fcm.googleapis.com";

/// FCM Client Configuration
#[derive(Debug, Clone)]
pub struct FcmConfig {
    /// Base URL of the send API, without trailing slash
    pub api_base_url: String,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Maximum number of concurrent sends in one multicast batch (default: 500)
    pub multicast_batch_size: usize,
    /// Cached tokens are refreshed this many seconds before expiry (default: 300)
    pub refresh_margin_secs: i64,
    /// Lifetime requested for the signed assertion (default: 3600)
    pub assertion_lifetime_secs: i64,
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            multicast_batch_size: 500,
            refresh_margin_secs: 300,
            assertion_lifetime_secs: 3600,
        }
    }
}

impl FcmConfig {
    /// Load overrides from `FCM_API_BASE_URL`, `FCM_REQUEST_TIMEOUT_SECS`
    /// and `FCM_MULTICAST_BATCH_SIZE`
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            api_base_url: std::env::var("FCM_API_BASE_URL")
                .unwrap_or(defaults.api_base_url),
            request_timeout: Duration::from_secs(parse_env(
                "FCM_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            multicast_batch_size: parse_env(
                "FCM_MULTICAST_BATCH_SIZE",
                defaults.multicast_batch_size,
            )?,
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_multicast_batch_size(mut self, size: usize) -> Self {
        self.multicast_batch_size = size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(FCMError::Config("api_base_url must not be empty".to_string()));
        }
        if self.multicast_batch_size == 0 {
            return Err(FCMError::Config(
                "multicast_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.refresh_margin_secs < 0 || self.assertion_lifetime_secs <= 0 {
            return Err(FCMError::Config(
                "token lifetimes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Send endpoint for a project
    pub fn send_url(&self, project_id: &str) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.api_base_url.trim_end_matches('/'),
            project_id
        )
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| FCMError::Config(format!("{} has invalid value {:?}: {}", name, raw, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("FCM_API_BASE_URL");
        std::env::remove_var("FCM_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("FCM_MULTICAST_BATCH_SIZE");
    }

    #[test]
    fn test_default_config() {
        let config = FcmConfig::default();
        assert_eq!(config.api_base_url, "https://fcm.googleapis.com");
        assert_eq!(config.multicast_batch_size, 500);
        assert_eq!(config.refresh_margin_secs, 300);
        assert_eq!(config.assertion_lifetime_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_send_url() {
        let config = FcmConfig::default();
        assert_eq!(
            config.send_url("my-project"),
            "https://fcm.googleapis.com/v1/projects/my-project/messages:send"
        );

        let local = FcmConfig::default().with_api_base_url("http://127.0.0.1:8080/");
        assert_eq!(
            local.send_url("p"),
            "http://127.0.0.1:8080/v1/projects/p/messages:send"
        );
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = FcmConfig::default().with_multicast_batch_size(0);
        assert!(matches!(config.validate(), Err(FCMError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = FcmConfig::from_env().unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("FCM_API_BASE_URL", "http://localhost:9000");
        std::env::set_var("FCM_REQUEST_TIMEOUT_SECS", "5");
        std::env::set_var("FCM_MULTICAST_BATCH_SIZE", "100");

        let config = FcmConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.api_base_url, "http://localhost:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.multicast_batch_size, 100);
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_value() {
        clear_env();
        std::env::set_var("FCM_MULTICAST_BATCH_SIZE", "lots");

        let result = FcmConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(FCMError::Config(_))));
    }
}
