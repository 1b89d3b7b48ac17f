use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::FcmConfig;
use crate::credentials::ServiceAccountKey;
use crate::errors::{FCMError, Result};
use crate::jwt::{AssertionSigner, JwtClaims, JWT_BEARER_GRANT};
use crate::models::*;
use crate::token::{Clock, GoogleTokenResponse, SystemClock, TokenCache};

/// Firebase Cloud Messaging Client
///
/// Manages OAuth2 token generation, caching, and message delivery for one
/// service account. Each client owns its own token cache; wrap it in an
/// `Arc` to share it between tasks.
pub struct FCMClient {
    credentials: Arc<ServiceAccountKey>,
    config: FcmConfig,
    signer: AssertionSigner,
    token_cache: Mutex<Option<TokenCache>>,
    clock: Arc<dyn Clock>,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for FCMClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FCMClient")
            .field("project_id", &self.credentials.project_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FCMClient {
    /// Create new FCM client with default configuration
    pub fn new(credentials: ServiceAccountKey) -> Result<Self> {
        Self::with_config(credentials, FcmConfig::default())
    }

    /// Create new FCM client
    ///
    /// # Arguments
    /// * `credentials` - Service account key with OAuth2 credentials
    /// * `config` - Endpoint, timeout and batching settings
    pub fn with_config(credentials: ServiceAccountKey, config: FcmConfig) -> Result<Self> {
        credentials.validate()?;
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FCMError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            project_id = %credentials.project_id,
            client_email = %credentials.client_email,
            "Initialized FCM client"
        );

        Ok(Self {
            signer: AssertionSigner::new(&credentials.private_key),
            credentials: Arc::new(credentials),
            config,
            token_cache: Mutex::new(None),
            clock: Arc::new(SystemClock),
            http_client,
        })
    }

    /// Replace the time source used for token expiry checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn project_id(&self) -> &str {
        &self.credentials.project_id
    }

    pub fn config(&self) -> &FcmConfig {
        &self.config
    }

    /// Get access token from service account (with caching)
    ///
    /// The cache lock is held across a refresh, so concurrent callers wait
    /// for the single in-flight exchange and then share its token.
    pub async fn get_access_token(&self) -> Result<String> {
        let mut cache = self.token_cache.lock().await;

        let now = self.clock.now();
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(now, self.config.refresh_margin_secs) {
                debug!(expires_at = cached.expires_at, "Using cached FCM access token");
                return Ok(cached.access_token.clone());
            }
        }

        let claims = JwtClaims::for_service_account(
            &self.credentials,
            now,
            self.config.assertion_lifetime_secs,
        );
        let assertion = self.signer.sign(&claims)?;

        let params = [
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http_client
            .post(self.credentials.token_endpoint())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            warn!(status = status.as_u16(), "OAuth2 token exchange failed");
            return Err(FCMError::TokenExchangeFailed {
                status: status.as_u16(),
                body,
            });
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| FCMError::TokenParseError(e.to_string()))?;

        let fresh = TokenCache::new(
            token_response.access_token,
            self.clock.now(),
            token_response.expires_in,
        );
        info!(expires_at = fresh.expires_at, "Obtained new FCM access token");

        let access_token = fresh.access_token.clone();
        *cache = Some(fresh);

        Ok(access_token)
    }

    /// Send notification via FCM to a single device
    pub async fn send_notification(
        &self,
        device_token: &str,
        notification: &Notification,
        data: &DataPayload,
    ) -> Result<SendResponse> {
        if device_token.is_empty() {
            return Err(FCMError::InvalidArgument(
                "device token must not be empty".to_string(),
            ));
        }
        validate_notification(notification)?;

        let message = FcmMessage::to_token(device_token, notification, data);
        let response = self.dispatch(&message).await;

        match &response {
            Ok(sent) => info!(
                token_prefix = %token_prefix(device_token),
                message_id = %sent.name,
                "FCM notification sent"
            ),
            Err(e) => error!(
                token_prefix = %token_prefix(device_token),
                error = %e,
                "FCM send failed"
            ),
        }

        response
    }

    /// Send multicast notification (to multiple devices)
    ///
    /// Tokens are sent in sequential batches of `multicast_batch_size`; the
    /// sends within a batch run concurrently. A failing token never aborts
    /// its siblings.
    pub async fn send_multicast_notification(
        &self,
        device_tokens: &[String],
        notification: &Notification,
        data: &DataPayload,
    ) -> Result<MulticastSendResult> {
        if device_tokens.is_empty() {
            return Err(FCMError::InvalidArgument(
                "device token list must not be empty".to_string(),
            ));
        }

        let mut result = MulticastSendResult {
            results: Vec::with_capacity(device_tokens.len()),
            ..Default::default()
        };

        for (index, batch) in batches(device_tokens, self.config.multicast_batch_size).enumerate() {
            debug!(batch = index, size = batch.len(), "Dispatching multicast batch");

            let settled = join_all(
                batch
                    .iter()
                    .map(|token| self.send_notification(token, notification, data)),
            )
            .await;

            for outcome in settled {
                result.push(outcome.into());
            }
        }

        info!(
            total = device_tokens.len(),
            success_count = result.success_count,
            failure_count = result.failure_count,
            "FCM multicast completed"
        );

        Ok(result)
    }

    /// Send notification to topic
    ///
    /// `topic` may be given bare (`news`) or prefixed (`/topics/news`).
    pub async fn send_topic_notification(
        &self,
        topic: &str,
        notification: &Notification,
        data: &DataPayload,
    ) -> Result<SendResponse> {
        if normalize_topic(topic).is_empty() {
            return Err(FCMError::InvalidArgument(
                "topic must not be empty".to_string(),
            ));
        }
        validate_notification(notification)?;

        let message = FcmMessage::to_topic(topic, notification, data);
        let response = self.dispatch(&message).await;

        match &response {
            Ok(sent) => info!(
                topic = %normalize_topic(topic),
                message_id = %sent.name,
                "FCM topic notification sent"
            ),
            Err(e) => error!(topic = %normalize_topic(topic), error = %e, "FCM topic send failed"),
        }

        response
    }

    /// Send to any [`DispatchTarget`]
    pub async fn send(
        &self,
        target: &DispatchTarget,
        notification: &Notification,
        data: &DataPayload,
    ) -> Result<DispatchOutcome> {
        match target {
            DispatchTarget::Token(token) => self
                .send_notification(token, notification, data)
                .await
                .map(DispatchOutcome::Single),
            DispatchTarget::Tokens(tokens) => self
                .send_multicast_notification(tokens, notification, data)
                .await
                .map(DispatchOutcome::Multicast),
            DispatchTarget::Topic(topic) => self
                .send_topic_notification(topic, notification, data)
                .await
                .map(DispatchOutcome::Single),
        }
    }

    async fn dispatch(&self, message: &FcmMessage<'_>) -> Result<SendResponse> {
        let access_token = self.get_access_token().await?;

        let response = self
            .http_client
            .post(self.config.send_url(&self.credentials.project_id))
            .bearer_auth(access_token)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(FCMError::DispatchFailed {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| FCMError::ResponseParseError(e.to_string()))
    }
}

fn validate_notification(notification: &Notification) -> Result<()> {
    if notification.title.is_empty() {
        return Err(FCMError::InvalidArgument(
            "notification title must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn batches(tokens: &[String], batch_size: usize) -> std::slice::Chunks<'_, String> {
    tokens.chunks(batch_size.max(1))
}

// Log only the first 8 chars of a device token
fn token_prefix(token: &str) -> String {
    token.chars().take(8).collect()
}
