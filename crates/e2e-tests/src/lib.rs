//! End-to-end test infrastructure for the registration topic pipeline.
//!
//! Provides a shared TestHarness that wires a real HTTP classifier
//! against a mock serving endpoint, plus an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use reason_analysis::Aggregator;
use reason_classifier::{ServingEndpointClient, ServingEndpointConfig, TopicClassifier};
use reason_pipeline::{BatchRunner, TopicPipeline};
use reason_storage::MemoryStore;
use reason_types::{Registration, TopicTaxonomy};

/// Endpoint name used by every harness.
pub const TEST_ENDPOINT: &str = "test-topic-model";

/// Path the classifier posts to for [`TEST_ENDPOINT`].
pub fn invocations_path() -> String {
    format!("/serving-endpoints/{}/invocations", TEST_ENDPOINT)
}

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Mock serving endpoint
    pub server: MockServer,
    /// Source and sink for the pipeline
    pub store: Arc<MemoryStore>,
    /// Request timeout applied to the classifier
    pub timeout: Duration,
}

impl TestHarness {
    /// Start a mock endpoint and seed the store with `registrations`.
    pub async fn new(registrations: Vec<Registration>) -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new().with_registrations(registrations));
        Self {
            server,
            store,
            timeout: Duration::from_secs(2),
        }
    }

    /// Endpoint config pointing at the mock server.
    pub fn endpoint_config(&self) -> ServingEndpointConfig {
        let mut config = ServingEndpointConfig::new(self.server.uri(), TEST_ENDPOINT, "dapi-test");
        config.timeout = self.timeout;
        config
    }

    /// HTTP-backed classifier over the default taxonomy.
    pub fn classifier(&self) -> TopicClassifier<ServingEndpointClient> {
        let client = ServingEndpointClient::new(self.endpoint_config())
            .expect("Failed to build HTTP client");
        TopicClassifier::new(client, TopicTaxonomy::default())
    }

    /// Pipeline reading from and writing to the harness store.
    pub fn pipeline(&self, concurrency: usize) -> TopicPipeline {
        let runner = BatchRunner::new(Arc::new(self.classifier())).with_concurrency(concurrency);
        TopicPipeline::new(
            self.store.clone(),
            self.store.clone(),
            runner,
            Aggregator::default(),
        )
    }

    /// Answer `reason` with `content` as the model's message text.
    pub async fn answer(&self, reason: &str, content: &str) {
        Mock::given(method("POST"))
            .and(path(invocations_path()))
            .and(UserMessage::new(reason))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
            .mount(&self.server)
            .await;
    }

    /// Answer `reason` with a well-formed JSON topic answer.
    pub async fn answer_topic(&self, reason: &str, topic: &str, confidence: f64) {
        let content = serde_json::json!({"topic": topic, "confidence": confidence}).to_string();
        self.answer(reason, &content).await;
    }

    /// Respond to `reason` with a bare HTTP status.
    pub async fn fail_with_status(&self, reason: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(invocations_path()))
            .and(UserMessage::new(reason))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Respond to `reason` only after the classifier has given up.
    pub async fn stall(&self, reason: &str) {
        Mock::given(method("POST"))
            .and(path(invocations_path()))
            .and(UserMessage::new(reason))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_body(r#"{"topic": "Other", "confidence": 1.0}"#))
                    .set_delay(self.timeout * 3),
            )
            .mount(&self.server)
            .await;
    }
}

/// Chat-completions response body carrying `content`.
pub fn chat_body(content: &str) -> Value {
    serde_json::json!({
        "choices": [
            {"message": {"role": "assistant", "content": content}}
        ]
    })
}

/// Matches requests whose user message is exactly the given text.
pub struct UserMessage(String);

impl UserMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl Match for UserMessage {
    fn matches(&self, request: &Request) -> bool {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return false;
        };
        body["messages"]
            .as_array()
            .map(|messages| {
                messages.iter().any(|m| {
                    m["role"] == "user" && m["content"].as_str() == Some(self.0.as_str())
                })
            })
            .unwrap_or(false)
    }
}

/// Registration helper.
pub fn registration(id: &str, reason: &str) -> Registration {
    Registration::new(id, reason)
}
