//! Batch classification of registrations.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::info;

use reason_classifier::Classifier;
use reason_types::{ClassificationResult, Registration};

/// Classifies a batch of registrations, one call per record.
///
/// Results are returned in input order. With the default concurrency of 1
/// each call completes before the next starts; a higher value keeps up to
/// that many calls in flight while preserving order.
pub struct BatchRunner {
    classifier: Arc<dyn Classifier>,
    progress_interval: usize,
    concurrency: usize,
}

impl BatchRunner {
    /// Create a sequential runner logging progress every 10 records.
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            progress_interval: 10,
            concurrency: 1,
        }
    }

    /// Log progress every `interval` records.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Keep up to `concurrency` classification calls in flight.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    /// Classify every record.
    pub async fn run(&self, records: &[Registration]) -> Vec<ClassificationResult> {
        let total = records.len();
        info!(
            total,
            concurrency = self.concurrency,
            "Classifying registrations"
        );

        let mut results = Vec::with_capacity(total);

        if self.concurrency == 1 {
            for record in records {
                let classification = self.classifier.classify(&record.reason).await;
                results.push(ClassificationResult::new(record, classification));
                self.log_progress(results.len(), total);
            }
        } else {
            let classifier = &self.classifier;
            let mut ordered = stream::iter(records)
                .map(|record| async move {
                    let classification = classifier.classify(&record.reason).await;
                    ClassificationResult::new(record, classification)
                })
                .buffered(self.concurrency);

            while let Some(result) = ordered.next().await {
                results.push(result);
                self.log_progress(results.len(), total);
            }
        }

        info!(classified = results.len(), "Classified registrations");
        results
    }

    fn log_progress(&self, done: usize, total: usize) {
        if done % self.progress_interval == 0 {
            info!("Classified {}/{}...", done, total);
        }
    }
}
