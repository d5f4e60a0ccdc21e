//! # reason-analysis
//!
//! Keyword extraction and per-topic aggregation over classified
//! registrations. Everything here is pure and deterministic: the same
//! input always yields the same output, including tie order.

pub mod aggregate;
pub mod keywords;

pub use aggregate::{distribution, Aggregator, DEFAULT_TOP_KEYWORDS};
pub use keywords::{is_stop_word, tokenize, top_keywords, STOP_WORDS};
