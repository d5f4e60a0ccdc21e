//! Chat-completion clients.

use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use reason_types::ClassifierSettings;

use crate::error::ClassifierError;

/// Trait for chat completion.
///
/// Implementations send one system instruction and one user message and
/// return the primary textual content of the answer.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ClassifierError>;
}

/// Configuration for [`ServingEndpointClient`].
#[derive(Debug, Clone)]
pub struct ServingEndpointConfig {
    /// Workspace base URL (e.g., "https://example.cloud.databricks.com")
    pub base_url: String,

    /// Serving endpoint name (e.g., "databricks-claude-haiku-4-5")
    pub endpoint: String,

    /// Bearer token
    pub token: SecretString,

    /// Request timeout
    pub timeout: Duration,

    /// Token-length cap for the answer
    pub max_tokens: u32,

    /// Sampling temperature; 0.0 asks for the most deterministic answer
    pub temperature: f32,

    /// Extra attempts after a transient failure
    pub max_retries: u32,
}

impl ServingEndpointConfig {
    /// Create a config with default request parameters.
    pub fn new(
        base_url: impl Into<String>,
        endpoint: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: endpoint.into(),
            token: SecretString::from(token.into()),
            timeout: Duration::from_secs(30),
            max_tokens: 100,
            temperature: 0.0,
            max_retries: 0,
        }
    }

    /// Build from loaded settings. Base URL and token are required.
    pub fn from_settings(settings: &ClassifierSettings) -> Result<Self, ClassifierError> {
        let base_url = settings
            .base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ClassifierError::Config("classifier.base_url is not set".to_string()))?;
        let token = settings
            .token
            .as_ref()
            .filter(|t| !t.expose_secret().is_empty())
            .ok_or_else(|| ClassifierError::Config("classifier.token is not set".to_string()))?;

        Ok(Self {
            base_url: base_url.to_string(),
            endpoint: settings.endpoint.clone(),
            token: token.clone(),
            timeout: settings.timeout(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            max_retries: settings.max_retries,
        })
    }

    /// Invocation URL for the configured endpoint.
    pub fn invocations_url(&self) -> String {
        format!(
            "{}/serving-endpoints/{}/invocations",
            self.base_url.trim_end_matches('/'),
            self.endpoint
        )
    }
}

#[derive(Serialize)]
struct InvocationRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct InvocationResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-style chat model behind a serving endpoint.
pub struct ServingEndpointClient {
    client: Client,
    config: ServingEndpointConfig,
}

impl ServingEndpointClient {
    /// Create a new client.
    pub fn new(config: ServingEndpointConfig) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClassifierError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ServingEndpointConfig {
        &self.config
    }

    /// Make a single request.
    async fn make_request(&self, system: &str, user: &str) -> Result<String, ClassifierError> {
        let request = InvocationRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.config.invocations_url())
            .bearer_auth(self.config.token.expose_secret())
            .json(&request)
            .send()
            .await?;

        if response.status() == 429 {
            return Err(ClassifierError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::HttpStatus { status, body });
        }

        let body: InvocationResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClassifierError::Parse("No content in response".to_string()))
    }
}

#[async_trait]
impl CompletionClient for ServingEndpointClient {
    /// Call the endpoint, retrying transient failures up to `max_retries` times.
    async fn complete(&self, system: &str, user: &str) -> Result<String, ClassifierError> {
        let mut backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(200),
            max_elapsed_time: self
                .config
                .timeout
                .checked_mul(self.config.max_retries.saturating_add(1)),
            ..Default::default()
        };

        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, endpoint = %self.config.endpoint, "Calling classification endpoint");

            match self.make_request(system, user).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    if !e.is_transient() || attempts > self.config.max_retries {
                        return Err(e);
                    }

                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                error = %e,
                                retry_in_ms = duration.as_millis(),
                                "Classification call failed, retrying"
                            );
                            tokio::time::sleep(duration).await;
                        }
                        None => return Err(e),
                    }
                }
            }
        }
    }
}
