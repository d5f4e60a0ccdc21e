//! End-to-end topic pipeline.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use reason_analysis::{distribution, Aggregator};
use reason_storage::{RegistrationSource, TopicSink, WriteReport};
use reason_types::{ClassificationOutcome, ClassificationResult, Registration, TopicAggregate};

use crate::error::PipelineError;
use crate::runner::BatchRunner;

/// Count of results per outcome kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeTally {
    pub classified: usize,
    pub invalid_topic: usize,
    pub failed: usize,
}

impl OutcomeTally {
    pub fn from_results(results: &[ClassificationResult]) -> Self {
        let mut tally = Self::default();
        for result in results {
            match result.outcome {
                ClassificationOutcome::Classified => tally.classified += 1,
                ClassificationOutcome::InvalidTopic { .. } => tally.invalid_topic += 1,
                ClassificationOutcome::Failed { .. } => tally.failed += 1,
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.classified + self.invalid_topic + self.failed
    }
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Registrations returned by the source
    pub loaded: usize,
    /// Registrations dropped for having a blank reason
    pub skipped_blank: usize,
    /// Per-record results in source order
    pub results: Vec<ClassificationResult>,
    /// Per-topic aggregates, highest count first
    pub aggregates: Vec<TopicAggregate>,
    pub outcomes: OutcomeTally,
    /// Outcome of replacing the assignments relation
    pub assignments: WriteReport,
    /// Outcome of replacing the aggregates relation
    pub topic_rows: WriteReport,
}

impl RunReport {
    /// Both relations were fully written.
    pub fn is_complete(&self) -> bool {
        self.assignments.is_complete() && self.topic_rows.is_complete()
    }
}

/// Source -> classify -> aggregate -> sink.
pub struct TopicPipeline {
    source: Arc<dyn RegistrationSource>,
    sink: Arc<dyn TopicSink>,
    runner: BatchRunner,
    aggregator: Aggregator,
}

impl TopicPipeline {
    pub fn new(
        source: Arc<dyn RegistrationSource>,
        sink: Arc<dyn TopicSink>,
        runner: BatchRunner,
        aggregator: Aggregator,
    ) -> Self {
        Self {
            source,
            sink,
            runner,
            aggregator,
        }
    }

    /// Run the whole pipeline once.
    ///
    /// Only a failure to read the source is returned as an error. The
    /// output relations are replaced even when every classification fell
    /// back, so they always reflect the latest run.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let loaded = self.source.load_registrations().await?;
        let loaded_count = loaded.len();

        let registrations: Vec<Registration> =
            loaded.into_iter().filter(Registration::has_reason).collect();
        let skipped_blank = loaded_count - registrations.len();
        if skipped_blank > 0 {
            warn!(skipped = skipped_blank, "Skipping registrations without a reason");
        }
        info!(count = registrations.len(), "Registrations to classify");

        let results = self.runner.run(&registrations).await;
        let outcomes = OutcomeTally::from_results(&results);

        info!(
            classified = outcomes.classified,
            invalid_topic = outcomes.invalid_topic,
            failed = outcomes.failed,
            "Classification finished"
        );
        for (topic, count) in distribution(&results) {
            info!(topic = %topic, count, "Topic distribution");
        }

        let aggregates = self.aggregator.aggregate(&results);
        for aggregate in &aggregates {
            info!(
                topic = %aggregate.topic_label,
                count = aggregate.count,
                top_words = %aggregate.top_words(),
                "Topic analysis"
            );
        }

        let assignments = self.sink.replace_registration_topics(&results).await;
        let topic_rows = self.sink.replace_topic_aggregates(&aggregates).await;

        if !assignments.is_complete() || !topic_rows.is_complete() {
            warn!(
                assignments_failed = assignments.failed(),
                aggregates_failed = topic_rows.failed(),
                "Some rows were not written"
            );
        }

        Ok(RunReport {
            loaded: loaded_count,
            skipped_blank,
            results,
            aggregates,
            outcomes,
            assignments,
            topic_rows,
        })
    }
}
