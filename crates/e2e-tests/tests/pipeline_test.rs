//! Full pipeline E2E tests.
//!
//! Drives source -> HTTP classifier -> aggregator -> sink with a mock
//! serving endpoint and verifies what lands in both output relations.

use pretty_assertions::assert_eq;

use e2e_tests::{registration, TestHarness};
use reason_types::{ClassificationOutcome, FailureKind};

const AI_MODELS: &str = "Machine learning models in production";
const AI_SCALING: &str = "Scaling machine learning";
const AI_AGENTS: &str = "Learning about LLM agents";
const DE_STREAMING: &str = "Streaming data pipelines";
const DE_QUALITY: &str = "Data quality checks";

async fn two_topic_harness() -> TestHarness {
    let harness = TestHarness::new(vec![
        registration("u1", AI_MODELS),
        registration("u2", DE_STREAMING),
        registration("u3", AI_SCALING),
        registration("u4", DE_QUALITY),
        registration("u5", AI_AGENTS),
    ])
    .await;

    for reason in [AI_MODELS, AI_SCALING, AI_AGENTS] {
        harness.answer_topic(reason, "AI/ML & GenAI", 0.9).await;
    }
    for reason in [DE_STREAMING, DE_QUALITY] {
        harness
            .answer_topic(reason, "Data Engineering & ETL", 0.8)
            .await;
    }
    harness
}

#[tokio::test]
async fn test_pipeline_writes_assignments_in_source_order() {
    let harness = two_topic_harness().await;

    let report = harness.pipeline(1).run().await.unwrap();

    assert!(report.is_complete());
    let assignments = harness.store.assignments();
    let rows: Vec<(&str, &str)> = assignments
        .iter()
        .map(|a| (a.user_id.as_str(), a.assigned_topic.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("u1", "AI/ML & GenAI"),
            ("u2", "Data Engineering & ETL"),
            ("u3", "AI/ML & GenAI"),
            ("u4", "Data Engineering & ETL"),
            ("u5", "AI/ML & GenAI"),
        ]
    );
    assert!(assignments
        .iter()
        .all(|a| a.updated_at == assignments[0].updated_at));
}

#[tokio::test]
async fn test_pipeline_aggregates_highest_count_first() {
    let harness = two_topic_harness().await;

    harness.pipeline(1).run().await.unwrap();

    let aggregates = harness.store.aggregates();
    let rows: Vec<(&str, i64, &str)> = aggregates
        .iter()
        .map(|a| (a.topic_label.as_str(), a.topic_count, a.top_words.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (
                "AI/ML & GenAI",
                3,
                "learning, machine, models, production, scaling"
            ),
            (
                "Data Engineering & ETL",
                2,
                "data, streaming, pipelines, quality, checks"
            ),
        ]
    );
}

#[tokio::test]
async fn test_aggregate_counts_sum_to_classified_records() {
    let harness = two_topic_harness().await;

    let report = harness.pipeline(1).run().await.unwrap();

    let total: i64 = harness
        .store
        .aggregates()
        .iter()
        .map(|a| a.topic_count)
        .sum();
    assert_eq!(total as usize, report.results.len());
    assert_eq!(report.outcomes.total(), report.results.len());
}

#[tokio::test]
async fn test_rerun_replaces_rather_than_appends() {
    let harness = two_topic_harness().await;
    let pipeline = harness.pipeline(1);

    pipeline.run().await.unwrap();
    let first: Vec<_> = harness
        .store
        .aggregates()
        .into_iter()
        .map(|a| (a.topic_label, a.topic_count, a.top_words))
        .collect();

    pipeline.run().await.unwrap();
    let second: Vec<_> = harness
        .store
        .aggregates()
        .into_iter()
        .map(|a| (a.topic_label, a.topic_count, a.top_words))
        .collect();

    assert_eq!(first, second);
    assert_eq!(harness.store.assignments().len(), 5);
}

#[tokio::test]
async fn test_blank_reasons_never_reach_the_endpoint() {
    let harness = TestHarness::new(vec![
        registration("u1", AI_MODELS),
        registration("u2", ""),
        registration("u3", "   "),
    ])
    .await;
    harness.answer_topic(AI_MODELS, "AI/ML & GenAI", 0.9).await;

    let report = harness.pipeline(1).run().await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].id, "u1");
    let requests = harness.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_endpoint_failure_falls_back_and_run_continues() {
    let harness = TestHarness::new(vec![
        registration("u1", AI_MODELS),
        registration("u2", "Quarterly planning offsite"),
        registration("u3", DE_QUALITY),
    ])
    .await;
    harness.answer_topic(AI_MODELS, "AI/ML & GenAI", 0.9).await;
    harness
        .fail_with_status("Quarterly planning offsite", 503)
        .await;
    harness
        .answer_topic(DE_QUALITY, "Data Engineering & ETL", 0.7)
        .await;

    let report = harness.pipeline(1).run().await.unwrap();

    let failed = &report.results[1];
    assert_eq!(failed.assigned_topic, "Other");
    assert_eq!(failed.confidence, 0.0);
    assert!(matches!(
        failed.outcome,
        ClassificationOutcome::Failed {
            failure: FailureKind::HttpStatus,
            ..
        }
    ));
    assert_eq!(report.outcomes.classified, 2);
    assert_eq!(report.outcomes.failed, 1);
    assert_eq!(harness.store.assignments().len(), 3);
}

#[tokio::test]
async fn test_topic_outside_taxonomy_maps_to_fallback() {
    let harness = TestHarness::new(vec![registration("u1", "Qubits and error correction")]).await;
    harness
        .answer_topic("Qubits and error correction", "Quantum Computing", 0.95)
        .await;

    let report = harness.pipeline(1).run().await.unwrap();

    let result = &report.results[0];
    assert_eq!(result.assigned_topic, "Other");
    assert_eq!(result.confidence, 0.3);
    assert_eq!(
        result.outcome,
        ClassificationOutcome::InvalidTopic {
            returned: Some("Quantum Computing".to_string())
        }
    );

    let aggregates = harness.store.aggregates();
    assert_eq!(aggregates.len(), 1);
    assert_eq!(aggregates[0].topic_label, "Other");
    assert_eq!(aggregates[0].top_words, "qubits, error, correction");
}

#[tokio::test]
async fn test_concurrent_run_matches_sequential_run() {
    let harness = two_topic_harness().await;

    let sequential = harness.pipeline(1).run().await.unwrap();
    let concurrent = harness.pipeline(4).run().await.unwrap();

    assert_eq!(sequential.results, concurrent.results);
    assert_eq!(sequential.aggregates, concurrent.aggregates);
}

#[tokio::test]
async fn test_empty_source_clears_outputs() {
    let harness = TestHarness::new(Vec::new()).await;

    let report = harness.pipeline(1).run().await.unwrap();

    assert!(report.results.is_empty());
    assert!(report.aggregates.is_empty());
    assert!(harness.store.assignments().is_empty());
    assert!(harness.store.aggregates().is_empty());
}
