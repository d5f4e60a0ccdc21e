//! # reason-classifier
//!
//! Topic classification of free-text registration reasons through a
//! hosted chat-completion endpoint.
//!
//! The crate is split in two layers:
//! - [`CompletionClient`]: sends a system instruction plus user text and
//!   returns the model's textual answer ([`ServingEndpointClient`] talks
//!   HTTP, [`MockCompletionClient`] is scripted for tests)
//! - [`TopicClassifier`]: builds the instruction from the taxonomy, parses
//!   and validates the answer, and substitutes the fallback topic when
//!   anything goes wrong
//!
//! [`Classifier::classify`] never fails: every input yields a
//! [`Classification`](reason_types::Classification) whose topic is a
//! taxonomy member.

mod classifier;
mod client;
mod error;
mod mock;
mod prompt;
mod response;

pub use classifier::{Classifier, TopicClassifier, LOG_SNIPPET_CHARS};
pub use client::{CompletionClient, ServingEndpointClient, ServingEndpointConfig};
pub use error::ClassifierError;
pub use mock::{MockCompletionClient, MockReply};
pub use prompt::build_system_prompt;
pub use response::{parse_answer, strip_code_fence, ModelAnswer, DEFAULT_CONFIDENCE};
