//! Per-topic aggregation of classification results.

use std::collections::HashMap;

use tracing::debug;

use reason_types::{ClassificationResult, TopicAggregate};

use crate::keywords::top_keywords;

/// Keywords kept per aggregate unless configured otherwise.
pub const DEFAULT_TOP_KEYWORDS: usize = 5;

/// Groups results by assigned topic and summarizes each group.
#[derive(Debug, Clone)]
pub struct Aggregator {
    top_keywords: usize,
}

impl Aggregator {
    /// Create an aggregator keeping `top_keywords` keywords per topic.
    pub fn new(top_keywords: usize) -> Self {
        Self { top_keywords }
    }

    /// Group `results` by exact topic label and summarize each group.
    ///
    /// Output is sorted by count descending; equal counts keep the order in
    /// which each topic first appeared. Topics without results are absent.
    pub fn aggregate(&self, results: &[ClassificationResult]) -> Vec<TopicAggregate> {
        let groups = group_by_topic(results);

        let mut aggregates: Vec<TopicAggregate> = groups
            .into_iter()
            .map(|(topic, reasons)| {
                let keywords = top_keywords(&reasons, self.top_keywords);
                TopicAggregate::new(topic, reasons.len() as u64, keywords)
            })
            .collect();

        aggregates.sort_by(|a, b| b.count.cmp(&a.count));

        debug!(
            results = results.len(),
            topics = aggregates.len(),
            "Aggregated classification results"
        );

        aggregates
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_KEYWORDS)
    }
}

/// Topic counts in the same order [`Aggregator::aggregate`] would emit them.
pub fn distribution(results: &[ClassificationResult]) -> Vec<(String, u64)> {
    let mut counts: Vec<(String, u64)> = group_by_topic(results)
        .into_iter()
        .map(|(topic, reasons)| (topic.to_string(), reasons.len() as u64))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Reasons per topic, groups in first-seen order.
fn group_by_topic(results: &[ClassificationResult]) -> Vec<(&str, Vec<&str>)> {
    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for result in results {
        let topic = result.assigned_topic.as_str();
        match positions.get(topic) {
            Some(&idx) => groups[idx].1.push(result.reason.as_str()),
            None => {
                positions.insert(topic, groups.len());
                groups.push((topic, vec![result.reason.as_str()]));
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use reason_types::{Classification, Registration};

    fn make_result(id: &str, reason: &str, topic: &str) -> ClassificationResult {
        ClassificationResult::new(
            &Registration::new(id, reason),
            Classification::classified(topic, 0.9),
        )
    }

    #[test]
    fn test_two_topics_sorted_by_count() {
        let results = vec![
            make_result("u1", "GenAI agents for support", "AI/ML & GenAI"),
            make_result("u2", "Just networking", "Other"),
            make_result("u3", "LLM agents in production", "AI/ML & GenAI"),
        ];

        let aggregates = Aggregator::default().aggregate(&results);
        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].topic_label, "AI/ML & GenAI");
        assert_eq!(aggregates[0].count, 2);
        assert_eq!(aggregates[0].representative_keywords[0], "agents");
        assert_eq!(aggregates[1].topic_label, "Other");
        assert_eq!(aggregates[1].count, 1);
        assert_eq!(
            aggregates[1].representative_keywords,
            vec!["just".to_string(), "networking".to_string()]
        );
    }

    #[test]
    fn test_counts_sum_to_results() {
        let topics = ["A", "B", "C", "A", "B", "A", "D"];
        let results: Vec<ClassificationResult> = topics
            .iter()
            .enumerate()
            .map(|(i, t)| make_result(&format!("u{}", i), "some reason text", t))
            .collect();

        let aggregates = Aggregator::default().aggregate(&results);
        let total: u64 = aggregates.iter().map(|a| a.count).sum();
        assert_eq!(total, results.len() as u64);
        assert!(aggregates.iter().all(|a| a.count > 0));
        for pair in aggregates.windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let results = vec![
            make_result("u1", "x", "B"),
            make_result("u2", "x", "A"),
            make_result("u3", "x", "C"),
        ];
        let labels: Vec<String> = Aggregator::default()
            .aggregate(&results)
            .into_iter()
            .map(|a| a.topic_label)
            .collect();
        assert_eq!(labels, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_grouping_is_exact() {
        let results = vec![
            make_result("u1", "x", "Other"),
            make_result("u2", "x", "other"),
        ];
        assert_eq!(Aggregator::default().aggregate(&results).len(), 2);
    }

    #[test]
    fn test_empty_results() {
        assert!(Aggregator::default().aggregate(&[]).is_empty());
        assert!(distribution(&[]).is_empty());
    }

    #[test]
    fn test_keyword_limit() {
        let results = vec![make_result(
            "u1",
            "alpha beta gamma delta epsilon zeta theta",
            "A",
        )];
        let aggregates = Aggregator::new(3).aggregate(&results);
        assert_eq!(aggregates[0].representative_keywords.len(), 3);
    }

    #[test]
    fn test_order_insensitive_counts() {
        let mut results = vec![
            make_result("u1", "spark streaming", "ETL"),
            make_result("u2", "genai", "AI"),
            make_result("u3", "kafka streaming", "ETL"),
        ];
        let forward = distribution(&results);
        results.reverse();
        let mut backward = distribution(&results);
        backward.sort();
        let mut forward_sorted = forward.clone();
        forward_sorted.sort();
        assert_eq!(forward_sorted, backward);
        assert_eq!(forward[0], ("ETL".to_string(), 2));
    }
}
