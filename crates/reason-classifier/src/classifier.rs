//! Taxonomy-constrained classification with fallback.

use async_trait::async_trait;
use tracing::{debug, warn};

use reason_types::{Classification, TopicTaxonomy};

use crate::client::CompletionClient;
use crate::error::ClassifierError;
use crate::prompt::build_system_prompt;
use crate::response::parse_answer;

/// Characters of the input text included in failure logs.
pub const LOG_SNIPPET_CHARS: usize = 50;

/// Assigns a taxonomy topic to a text.
///
/// Implementations must not fail: every call yields a classification
/// whose topic is a taxonomy member.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Classification;

    /// Taxonomy the classifier assigns from.
    fn taxonomy(&self) -> &TopicTaxonomy;
}

/// Classifier backed by a chat-completion model.
pub struct TopicClassifier<C: CompletionClient> {
    client: C,
    taxonomy: TopicTaxonomy,
    system_prompt: String,
}

impl<C: CompletionClient> TopicClassifier<C> {
    /// Create a classifier for `taxonomy`.
    pub fn new(client: C, taxonomy: TopicTaxonomy) -> Self {
        let system_prompt = build_system_prompt(&taxonomy);
        Self {
            client,
            taxonomy,
            system_prompt,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    async fn try_classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        let content = self.client.complete(&self.system_prompt, text).await?;
        let answer = parse_answer(&content)?;

        let resolved = answer
            .topic
            .as_deref()
            .and_then(|t| self.taxonomy.resolve(t));

        let classification = match resolved {
            Some(topic) => Classification::classified(topic, answer.confidence),
            None => {
                warn!(
                    returned = ?answer.topic,
                    text = %snippet(text),
                    "Model returned a topic outside the taxonomy"
                );
                Classification::invalid_topic(&self.taxonomy, answer.topic)
            }
        };

        Ok(classification)
    }
}

#[async_trait]
impl<C: CompletionClient> Classifier for TopicClassifier<C> {
    async fn classify(&self, text: &str) -> Classification {
        match self.try_classify(text).await {
            Ok(classification) => {
                debug!(
                    topic = %classification.topic,
                    confidence = classification.confidence,
                    "Classified text"
                );
                classification
            }
            Err(e) => {
                warn!(error = %e, text = %snippet(text), "Classification failed, using fallback");
                Classification::failed(&self.taxonomy, e.failure_kind(), e.to_string())
            }
        }
    }

    fn taxonomy(&self) -> &TopicTaxonomy {
        &self.taxonomy
    }
}

/// First [`LOG_SNIPPET_CHARS`] characters of `text`, with an ellipsis if cut.
fn snippet(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(LOG_SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
