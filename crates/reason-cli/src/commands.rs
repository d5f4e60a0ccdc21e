//! Command implementations for the topic pipeline.
//!
//! Handles:
//! - run: Load registrations, classify, aggregate, replace output tables
//! - classify: Classify a single text against the configured endpoint
//! - topics: Print the stored topic analysis

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reason_analysis::Aggregator;
use reason_classifier::{Classifier, ServingEndpointClient, ServingEndpointConfig, TopicClassifier};
use reason_pipeline::{BatchRunner, RunReport, TopicPipeline};
use reason_storage::{MemoryStore, PgTopicStore, RegistrationSource, TopicSink};
use reason_types::Settings;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_logging(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    Ok(())
}

/// Load layered settings, apply CLI overrides, and validate.
pub fn load_settings(config_path: Option<&str>, log_level: Option<&str>) -> Result<Settings> {
    let settings = Settings::load(config_path).context("Failed to load configuration")?;
    apply_overrides(settings, log_level)
}

/// Apply CLI flag overrides on top of loaded settings, then validate.
fn apply_overrides(mut settings: Settings, log_level: Option<&str>) -> Result<Settings> {
    if let Some(level) = log_level {
        settings.log_level = level.to_string();
    }

    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

/// Build the classifier backed by the hosted serving endpoint.
pub fn build_classifier(settings: &Settings) -> Result<Arc<dyn Classifier>> {
    let taxonomy = settings.taxonomy().context("Invalid taxonomy")?;
    let config = ServingEndpointConfig::from_settings(&settings.classifier)
        .context("Classifier endpoint is not configured")?;
    let client = ServingEndpointClient::new(config).context("Failed to build HTTP client")?;

    Ok(Arc::new(TopicClassifier::new(client, taxonomy)))
}

/// Run the full pipeline once.
///
/// With `dry_run` the results are kept in memory and the output tables
/// are left untouched.
pub async fn run_pipeline(settings: &Settings, dry_run: bool) -> Result<RunReport> {
    info!(
        endpoint = %settings.classifier.endpoint,
        source = %settings.tables.registrations,
        concurrency = settings.pipeline.concurrency,
        dry_run,
        "Starting topic classification"
    );

    let classifier = build_classifier(settings)?;
    let store = Arc::new(
        PgTopicStore::connect(&settings.database, settings.tables.clone())
            .await
            .context("Failed to connect to database")?,
    );

    let source: Arc<dyn RegistrationSource> = store.clone();
    let sink: Arc<dyn TopicSink> = if dry_run {
        Arc::new(MemoryStore::new())
    } else {
        store
    };

    let runner = BatchRunner::new(classifier)
        .with_progress_interval(settings.pipeline.progress_interval)
        .with_concurrency(settings.pipeline.concurrency);
    let aggregator = Aggregator::new(settings.pipeline.top_keywords);

    let report = TopicPipeline::new(source, sink, runner, aggregator)
        .run()
        .await
        .context("Pipeline failed")?;

    print_report(&report, dry_run);
    Ok(report)
}

fn print_report(report: &RunReport, dry_run: bool) {
    println!(
        "Classified {} registrations ({} skipped without a reason)",
        report.results.len(),
        report.skipped_blank
    );
    println!(
        "Outcomes: {} classified, {} invalid topic, {} failed",
        report.outcomes.classified, report.outcomes.invalid_topic, report.outcomes.failed
    );
    println!();
    for aggregate in &report.aggregates {
        println!(
            "{:<32} {:>6}  {}",
            aggregate.topic_label,
            aggregate.count,
            aggregate.top_words()
        );
    }
    println!();
    if dry_run {
        println!("Dry run: output tables were not modified");
    } else {
        println!(
            "Wrote {}/{} rows to {} and {}/{} rows to {}",
            report.assignments.written,
            report.assignments.intended,
            report.assignments.table,
            report.topic_rows.written,
            report.topic_rows.intended,
            report.topic_rows.table
        );
    }
}

/// Classify one text and print the outcome.
pub async fn classify_text(settings: &Settings, text: &str) -> Result<()> {
    let classifier = build_classifier(settings)?;
    let classification = classifier.classify(text).await;

    println!("Topic:      {}", classification.topic);
    println!("Confidence: {:.2}", classification.confidence);
    println!("Outcome:    {}", classification.outcome.name());

    Ok(())
}

/// Print the stored topic analysis, highest count first.
pub async fn show_topics(settings: &Settings) -> Result<()> {
    let store = PgTopicStore::connect(&settings.database, settings.tables.clone())
        .await
        .context("Failed to connect to database")?;
    let aggregates = store
        .load_topic_aggregates()
        .await
        .context("Failed to load topic analysis")?;

    if aggregates.is_empty() {
        println!("No topic analysis stored in {}", settings.tables.aggregates);
        return Ok(());
    }

    for aggregate in aggregates {
        println!(
            "{:<32} {:>6}  {}  ({})",
            aggregate.topic_label,
            aggregate.topic_count,
            aggregate.top_words,
            aggregate.updated_at.to_rfc3339()
        );
    }

    Ok(())
}
