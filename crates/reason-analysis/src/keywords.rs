//! Frequency-based keyword extraction.
//!
//! Pure Rust implementation with a fixed stop-word list tuned for short
//! "why are you attending" answers.

use std::collections::HashMap;

/// Minimum token length kept by [`tokenize`].
const MIN_TOKEN_LEN: usize = 3;

/// Words never reported as keywords.
///
/// Common English function words plus verbs that appear in almost every
/// registration reason.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should", "may", "might", "shall", "can", "need", "our", "we", "i", "my",
    "me", "you", "your", "their", "its", "this", "that", "these", "those", "from", "into", "about",
    "how", "what", "which", "who", "want", "looking", "interested", "learn", "building", "using",
];

/// Check if a word is a stop word.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Tokenize text into lowercase keyword candidates.
///
/// A candidate is a maximal run of word characters (alphanumeric or `_`)
/// made only of ASCII `a`-`z`, at least three long, and not a stop word.
/// Runs mixing letters with digits, underscores or accented characters are
/// dropped whole rather than split.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|s| s.len() >= MIN_TOKEN_LEN)
        .filter(|s| s.chars().all(|c| c.is_ascii_lowercase()))
        .filter(|s| !is_stop_word(s))
        .map(String::from)
        .collect()
}

/// Return the `n` most frequent keywords across all `texts`.
///
/// Ordered by descending frequency; equal frequencies keep the order in
/// which the words were first seen.
pub fn top_keywords<S: AsRef<str>>(texts: &[S], n: usize) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for text in texts {
        for token in tokenize(text.as_ref()) {
            match positions.get(&token) {
                Some(&idx) => counts[idx].1 += 1,
                None => {
                    positions.insert(token.clone(), counts.len());
                    counts.push((token, 1));
                }
            }
        }
    }

    // Stable sort: ties stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts.into_iter().take(n).map(|(word, _)| word).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize("Lakehouse Migration");
        assert_eq!(tokens, vec!["lakehouse", "migration"]);
    }

    #[test]
    fn test_tokenize_removes_stop_words() {
        let tokens = tokenize("I want to learn about the lakehouse");
        assert_eq!(tokens, vec!["lakehouse"]);
    }

    #[test]
    fn test_tokenize_removes_short_tokens() {
        let tokens = tokenize("ML and AI on dbt");
        assert_eq!(tokens, vec!["dbt"]);
    }

    #[test]
    fn test_tokenize_drops_mixed_runs() {
        // Word-character runs containing digits or underscores are not split
        let tokens = tokenize("gpt4 delta_lake spark3 streaming");
        assert_eq!(tokens, vec!["streaming"]);
    }

    #[test]
    fn test_tokenize_handles_punctuation() {
        let tokens = tokenize("ETL, governance & security!");
        assert_eq!(tokens, vec!["etl", "governance", "security"]);
    }

    #[test]
    fn test_tokenize_apostrophe_splits() {
        let tokens = tokenize("Don't miss Unity Catalog's lineage");
        assert_eq!(tokens, vec!["don", "miss", "unity", "catalog", "lineage"]);
    }

    #[test]
    fn test_is_stop_word() {
        assert!(is_stop_word("the"));
        assert!(is_stop_word("building"));
        assert!(is_stop_word("interested"));
        assert!(!is_stop_word("pipeline"));
    }

    #[test]
    fn test_top_keywords_by_frequency() {
        let texts = [
            "Building an ML pipeline for fraud detection",
            "Fraud models in production",
            "Production ML pipeline monitoring",
        ];
        let top = top_keywords(&texts, 3);
        // pipeline, fraud and production each appear twice; first-seen order
        assert_eq!(top, vec!["pipeline", "fraud", "production"]);
    }

    #[test]
    fn test_top_keywords_respects_n() {
        let texts = ["alpha beta gamma delta epsilon zeta eta theta"];
        assert_eq!(top_keywords(&texts, 5).len(), 5);
        assert_eq!(top_keywords(&texts, 0).len(), 0);
        assert_eq!(top_keywords(&texts, 100).len(), 8);
    }

    #[test]
    fn test_top_keywords_empty() {
        let texts: [&str; 0] = [];
        assert!(top_keywords(&texts, 5).is_empty());
        assert!(top_keywords(&["the and of"], 5).is_empty());
    }

    #[test]
    fn test_top_keywords_properties() {
        let texts = [
            "I'm interested in GenAI agents & RAG with Vector Search!!",
            "Evaluating Snowflake vs. Databricks for our 2025 migration",
            "Learn Delta Live Tables, Auto-Loader and streaming ETL",
        ];
        let top = top_keywords(&texts, 5);
        assert!(top.len() <= 5);
        for word in &top {
            assert!(word.len() >= 3);
            assert!(word.chars().all(|c| c.is_ascii_lowercase()));
            assert!(!is_stop_word(word));
        }
    }

    #[test]
    fn test_top_keywords_deterministic() {
        let texts = ["zebra apple mango", "mango apple zebra"];
        let first = top_keywords(&texts, 3);
        for _ in 0..10 {
            assert_eq!(top_keywords(&texts, 3), first);
        }
        assert_eq!(first, vec!["zebra", "apple", "mango"]);
    }
}
