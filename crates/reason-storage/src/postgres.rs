//! PostgreSQL-backed store.
//!
//! Values are always bound as parameters. Table names cannot be bound, so
//! they are checked with [`is_sql_identifier`] before any SQL is built.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{PgPool, Row};
use tracing::{info, instrument, warn};

use reason_types::config::is_sql_identifier;
use reason_types::{ClassificationResult, DatabaseSettings, Registration, TableSettings, TopicAggregate};

use crate::error::StorageError;
use crate::store::{RegistrationSource, StoredAggregate, TopicSink, WriteReport};

/// Store reading registrations from and writing topic tables to PostgreSQL.
#[derive(Clone)]
pub struct PgTopicStore {
    pool: PgPool,
    tables: TableSettings,
}

impl PgTopicStore {
    /// Connect a bounded pool using `database`.
    pub async fn connect(
        database: &DatabaseSettings,
        tables: TableSettings,
    ) -> Result<Self, StorageError> {
        validate_tables(&tables)?;

        let options = connect_options(database)?;
        let pool = PgPoolOptions::new()
            .max_connections(database.max_connections)
            .acquire_timeout(database.connect_timeout())
            .connect_with(options)
            .await?;

        info!(
            host = %database.host,
            database = %database.name,
            max_connections = database.max_connections,
            "Connected to PostgreSQL"
        );

        Ok(Self { pool, tables })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, tables: TableSettings) -> Result<Self, StorageError> {
        validate_tables(&tables)?;
        Ok(Self { pool, tables })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Delete every row in `table`. Failure is logged, not raised.
    async fn clear(&self, table: &str) -> bool {
        match sqlx::query(&delete_all_sql(table))
            .execute(&self.pool)
            .await
        {
            Ok(done) => {
                info!(table, rows = done.rows_affected(), "Cleared existing rows");
                true
            }
            Err(e) => {
                info!(table, error = %e, "Clear failed (table may not exist yet)");
                false
            }
        }
    }
}

#[async_trait]
impl RegistrationSource for PgTopicStore {
    #[instrument(skip(self), fields(table = %self.tables.registrations))]
    async fn load_registrations(&self) -> Result<Vec<Registration>, StorageError> {
        let sql = select_registrations_sql(&self.tables);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut registrations = Vec::with_capacity(rows.len());
        for row in rows {
            registrations.push(Registration::new(
                row.try_get::<String, _>("user_id")?,
                row.try_get::<String, _>("reason")?,
            ));
        }

        info!(count = registrations.len(), "Loaded registrations");
        Ok(registrations)
    }
}

#[async_trait]
impl TopicSink for PgTopicStore {
    #[instrument(skip_all, fields(table = %self.tables.assignments, rows = results.len()))]
    async fn replace_registration_topics(&self, results: &[ClassificationResult]) -> WriteReport {
        let table = &self.tables.assignments;
        let mut report = WriteReport::new(table.as_str(), results.len());
        let updated_at = Utc::now();

        report.cleared = self.clear(table).await;

        let sql = insert_assignment_sql(table);
        for result in results {
            let inserted = sqlx::query(&sql)
                .bind(&result.id)
                .bind(&result.assigned_topic)
                .bind(result.confidence)
                .bind(updated_at)
                .execute(&self.pool)
                .await;

            match inserted {
                Ok(_) => report.written += 1,
                Err(e) => warn!(user_id = %result.id, error = %e, "Failed to insert topic assignment"),
            }
        }

        info!(
            written = report.written,
            intended = report.intended,
            "Inserted registration topic assignments"
        );
        report
    }

    #[instrument(skip_all, fields(table = %self.tables.aggregates, rows = aggregates.len()))]
    async fn replace_topic_aggregates(&self, aggregates: &[TopicAggregate]) -> WriteReport {
        let table = &self.tables.aggregates;
        let mut report = WriteReport::new(table.as_str(), aggregates.len());
        let updated_at = Utc::now();

        report.cleared = self.clear(table).await;

        let sql = insert_aggregate_sql(table);
        for aggregate in aggregates {
            let inserted = sqlx::query(&sql)
                .bind(&aggregate.topic_label)
                .bind(aggregate.count as i64)
                .bind(aggregate.top_words())
                .bind(updated_at)
                .execute(&self.pool)
                .await;

            match inserted {
                Ok(_) => report.written += 1,
                Err(e) => warn!(
                    topic = %aggregate.topic_label,
                    error = %e,
                    "Failed to insert topic aggregate"
                ),
            }
        }

        info!(
            written = report.written,
            intended = report.intended,
            "Inserted topic analysis rows"
        );
        report
    }

    async fn load_topic_aggregates(&self) -> Result<Vec<StoredAggregate>, StorageError> {
        let sql = select_aggregates_sql(&self.tables.aggregates);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut aggregates = Vec::with_capacity(rows.len());
        for row in rows {
            aggregates.push(StoredAggregate {
                topic_label: row.try_get("topic_label")?,
                topic_count: row.try_get("topic_count")?,
                top_words: row
                    .try_get::<Option<String>, _>("top_words")?
                    .unwrap_or_default(),
                updated_at: row.try_get("updated_at")?,
            });
        }
        Ok(aggregates)
    }
}

/// Build connection options from settings; a URL wins over the individual fields.
fn connect_options(database: &DatabaseSettings) -> Result<PgConnectOptions, StorageError> {
    if let Some(url) = &database.url {
        return Ok(PgConnectOptions::from_str(url.expose_secret())?);
    }

    let mut options = PgConnectOptions::new()
        .host(&database.host)
        .port(database.port)
        .database(&database.name)
        .ssl_mode(if database.ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        });

    if let Some(user) = &database.user {
        options = options.username(user);
    }
    if let Some(password) = &database.password {
        options = options.password(password.expose_secret());
    }
    Ok(options)
}

fn validate_tables(tables: &TableSettings) -> Result<(), StorageError> {
    for name in [&tables.registrations, &tables.assignments, &tables.aggregates] {
        if !is_sql_identifier(name) {
            return Err(StorageError::Config(format!("invalid table name {:?}", name)));
        }
    }
    if let Some(column) = &tables.order_by {
        if !is_sql_identifier(column) || column.contains('.') {
            return Err(StorageError::Config(format!(
                "invalid order_by column {:?}",
                column
            )));
        }
    }
    Ok(())
}

fn select_registrations_sql(tables: &TableSettings) -> String {
    let order = tables
        .order_by
        .as_ref()
        .map(|c| format!(" ORDER BY {}", c))
        .unwrap_or_default();
    format!(
        "SELECT CAST(user_id AS TEXT) AS user_id, reason FROM {} \
         WHERE reason IS NOT NULL AND btrim(reason) <> ''{}",
        tables.registrations, order
    )
}

fn delete_all_sql(table: &str) -> String {
    format!("DELETE FROM {}", table)
}

fn insert_assignment_sql(table: &str) -> String {
    format!(
        "INSERT INTO {} (user_id, assigned_topic, confidence, updated_at) VALUES ($1, $2, $3, $4)",
        table
    )
}

fn insert_aggregate_sql(table: &str) -> String {
    format!(
        "INSERT INTO {} (topic_label, topic_count, top_words, updated_at) VALUES ($1, $2, $3, $4)",
        table
    )
}

fn select_aggregates_sql(table: &str) -> String {
    format!(
        "SELECT topic_label, CAST(topic_count AS BIGINT) AS topic_count, top_words, \
         CAST(updated_at AS TIMESTAMPTZ) AS updated_at FROM {} \
         ORDER BY topic_count DESC, topic_label",
        table
    )
}
