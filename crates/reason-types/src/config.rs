//! Configuration loading for reason-topics.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `<config dir>/reason-topics/config.toml`.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::TypesError;
use crate::taxonomy::{TopicTaxonomy, DEFAULT_FALLBACK, DEFAULT_TOPICS};

/// Environment variable prefix, e.g. `REASON_TOPICS_CLASSIFIER__TOKEN`.
pub const ENV_PREFIX: &str = "REASON_TOPICS";

/// Upper bound accepted for `classifier.max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// PostgreSQL connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Full connection URL; takes precedence over the individual fields
    #[serde(default, skip_serializing)]
    pub url: Option<SecretString>,

    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    /// Database name
    #[serde(default = "default_db_name")]
    pub name: String,

    #[serde(default)]
    pub user: Option<String>,

    /// Loaded from env var, not stored in config file
    #[serde(default, skip_serializing)]
    pub password: Option<SecretString>,

    /// Require TLS
    #[serde(default)]
    pub ssl: bool,

    /// Upper bound on pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            host: default_db_host(),
            port: default_db_port(),
            name: default_db_name(),
            user: None,
            password: None,
            ssl: false,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl DatabaseSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Names of the three relations the pipeline touches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSettings {
    /// Source relation with (user_id, reason)
    #[serde(default = "default_registrations_table")]
    pub registrations: String,

    /// Per-record output relation
    #[serde(default = "default_assignments_table")]
    pub assignments: String,

    /// Per-topic output relation
    #[serde(default = "default_aggregates_table")]
    pub aggregates: String,

    /// Optional source column to read registrations in a stable order
    #[serde(default)]
    pub order_by: Option<String>,
}

fn default_registrations_table() -> String {
    "public.event_registrations".to_string()
}

fn default_assignments_table() -> String {
    "public.registration_topics".to_string()
}

fn default_aggregates_table() -> String {
    "public.topic_analysis".to_string()
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            registrations: default_registrations_table(),
            assignments: default_assignments_table(),
            aggregates: default_aggregates_table(),
            order_by: None,
        }
    }
}

/// Hosted classification endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Workspace base URL (e.g. "https://example.cloud.databricks.com")
    #[serde(default)]
    pub base_url: Option<String>,

    /// Serving endpoint name
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token (loaded from env var, not stored in config file)
    #[serde(default, skip_serializing)]
    pub token: Option<SecretString>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Token-length cap sent with each request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: f32,

    /// Extra attempts after the first failure (0 = single attempt)
    #[serde(default)]
    pub max_retries: u32,
}

fn default_endpoint() -> String {
    "databricks-claude-haiku-4-5".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    100
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            endpoint: default_endpoint(),
            token: None,
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            max_retries: 0,
        }
    }
}

impl ClassifierSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Taxonomy as written in config; validated by [`Settings::taxonomy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomySettings {
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,

    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_topics() -> Vec<String> {
    DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK.to_string()
}

impl Default for TaxonomySettings {
    fn default() -> Self {
        Self {
            topics: default_topics(),
            fallback: default_fallback(),
        }
    }
}

/// Batch behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Log progress every N classified records
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// Classification calls in flight at once (1 = strictly sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Keywords kept per topic aggregate
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,
}

fn default_progress_interval() -> usize {
    10
}

fn default_concurrency() -> usize {
    1
}

fn default_top_keywords() -> usize {
    5
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            progress_interval: default_progress_interval(),
            concurrency: default_concurrency(),
            top_keywords: default_top_keywords(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub tables: TableSettings,

    #[serde(default)]
    pub classifier: ClassifierSettings,

    #[serde(default)]
    pub taxonomy: TaxonomySettings,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseSettings::default(),
            tables: TableSettings::default(),
            classifier: ClassifierSettings::default(),
            taxonomy: TaxonomySettings::default(),
            pipeline: PipelineSettings::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Default config file (optional)
    /// 3. CLI-specified config file (required when given)
    /// 4. Environment variables (REASON_TOPICS_*, `__` between sections)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, TypesError> {
        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("classifier.endpoint", default_endpoint())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("classifier.timeout_secs", default_timeout_secs() as i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("pipeline.progress_interval", default_progress_interval() as i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path().to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("taxonomy.topics"),
        );

        let config = builder
            .build()
            .map_err(|e| TypesError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| TypesError::Config(e.to_string()))
    }

    /// Build the validated taxonomy.
    pub fn taxonomy(&self) -> Result<TopicTaxonomy, TypesError> {
        TopicTaxonomy::new(self.taxonomy.topics.clone(), self.taxonomy.fallback.clone())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), TypesError> {
        self.taxonomy()?;

        for (field, name) in [
            ("tables.registrations", &self.tables.registrations),
            ("tables.assignments", &self.tables.assignments),
            ("tables.aggregates", &self.tables.aggregates),
        ] {
            if !is_sql_identifier(name) {
                return Err(TypesError::Config(format!(
                    "{} is not a valid table name: {:?}",
                    field, name
                )));
            }
        }
        if let Some(column) = &self.tables.order_by {
            if !is_sql_identifier(column) || column.contains('.') {
                return Err(TypesError::Config(format!(
                    "tables.order_by is not a valid column name: {:?}",
                    column
                )));
            }
        }

        if self.classifier.timeout_secs == 0 {
            return Err(TypesError::Config(
                "classifier.timeout_secs must be > 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.classifier.temperature) {
            return Err(TypesError::Config(format!(
                "classifier.temperature must be 0.0-2.0, got {}",
                self.classifier.temperature
            )));
        }
        if self.classifier.max_retries > MAX_RETRIES_LIMIT {
            return Err(TypesError::Config(format!(
                "classifier.max_retries must be <= {}, got {}",
                MAX_RETRIES_LIMIT, self.classifier.max_retries
            )));
        }
        if self.pipeline.progress_interval == 0 {
            return Err(TypesError::Config(
                "pipeline.progress_interval must be > 0".to_string(),
            ));
        }
        if self.pipeline.concurrency == 0 {
            return Err(TypesError::Config(
                "pipeline.concurrency must be > 0".to_string(),
            ));
        }
        if self.pipeline.top_keywords == 0 {
            return Err(TypesError::Config(
                "pipeline.top_keywords must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Location of the optional default config file (extension resolved by `config`).
pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "reason-topics")
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config")
}

/// Whether `name` is a plain or schema-qualified SQL identifier
/// (`table`, `schema.table`, `catalog.schema.table`).
pub fn is_sql_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 3 {
        return false;
    }
    parts.iter().all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}
