//! Scripted completion client for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::CompletionClient;
use crate::error::ClassifierError;

/// A scripted answer.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this content
    Content(String),
    /// Fail with a transport error carrying this message
    Transport(String),
    /// Fail with a timeout
    Timeout,
}

impl MockReply {
    /// Content of a well-formed JSON answer.
    pub fn answer(topic: &str, confidence: f64) -> Self {
        MockReply::Content(
            serde_json::json!({ "topic": topic, "confidence": confidence }).to_string(),
        )
    }

    fn to_result(&self) -> Result<String, ClassifierError> {
        match self {
            MockReply::Content(content) => Ok(content.clone()),
            MockReply::Transport(message) => Err(ClassifierError::Transport(message.clone())),
            MockReply::Timeout => Err(ClassifierError::Timeout),
        }
    }
}

/// Mock client answering by exact user text, with a default for anything else.
///
/// Useful for testing without making API calls.
pub struct MockCompletionClient {
    replies: HashMap<String, MockReply>,
    default_reply: MockReply,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MockCompletionClient {
    /// Create a mock that answers every text with `default_reply`.
    pub fn new(default_reply: MockReply) -> Self {
        Self {
            replies: HashMap::new(),
            default_reply,
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Answer `text` with `reply`.
    pub fn with_reply(mut self, text: impl Into<String>, reply: MockReply) -> Self {
        self.replies.insert(text.into(), reply);
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// User texts in the order they were received.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(user.to_string());
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.replies
            .get(user)
            .unwrap_or(&self.default_reply)
            .to_result()
    }
}
