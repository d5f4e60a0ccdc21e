//! # reason-storage
//!
//! Relational persistence for the registration topic pipeline.
//!
//! ## Relations
//! - source: `(user_id, reason)`, read-only
//! - assignments: `(user_id, assigned_topic, confidence, updated_at)`
//! - aggregates: `(topic_label, topic_count, top_words, updated_at)`
//!
//! Both output relations are replaced wholesale on every run. Writers never
//! abort on a single bad row; they report how many rows made it.
//!
//! [`PgTopicStore`] talks to PostgreSQL through sqlx with bound parameters.
//! [`MemoryStore`] keeps everything in memory and can inject failures.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use postgres::PgTopicStore;
pub use store::{RegistrationSource, StoredAggregate, StoredAssignment, TopicSink, WriteReport};
