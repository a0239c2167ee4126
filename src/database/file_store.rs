use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row};
use tokio::sync::OnceCell;
use tracing::debug;
use uuid::Uuid;

use crate::database::manager::{DatabaseManager, StoreError};
use crate::database::models::{FileSnapshot, ProcessingResult};

/// Access to the uploaded-files table
#[async_trait]
pub trait FileRecordStore: Send + Sync {
    /// Current metadata and version stamp, or `None` when no row has `id`
    async fn snapshot(&self, id: &str) -> Result<Option<FileSnapshot>, StoreError>;

    /// Write processing results to an existing row, but only while its
    /// `updated_at` still equals `expected`. Returns `false` when no row
    /// matched (changed by another writer, or gone). Never inserts.
    async fn apply_result(
        &self,
        id: &str,
        result: &ProcessingResult,
        expected: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError>;

    /// Round-trip to the backend
    async fn ping(&self) -> Result<(), StoreError>;
}

/// How `id` is compared, chosen from the column's declared type so the
/// primary-key index stays usable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColumn {
    /// `uuid` column: ids are parsed and bound as [`Uuid`]
    Uuid,
    /// Character column: ids are bound as text
    Text,
    /// Anything else (e.g. integer keys): compared through `id::text`
    Other,
}

/// A file id ready to bind, or proof that no row can have it
enum KeyParam {
    Uuid(Uuid),
    Text(String),
    Unmatchable,
}

impl KeyColumn {
    pub fn from_data_type(data_type: &str) -> Self {
        match data_type {
            "uuid" => KeyColumn::Uuid,
            "text" | "character varying" | "character" => KeyColumn::Text,
            _ => KeyColumn::Other,
        }
    }

    /// `WHERE` fragment matching the id bound as `$1`
    pub fn predicate(&self) -> &'static str {
        match self {
            KeyColumn::Uuid | KeyColumn::Text => "id = $1",
            KeyColumn::Other => "id::text = $1",
        }
    }

    fn param(&self, id: &str) -> KeyParam {
        match self {
            KeyColumn::Uuid => Uuid::parse_str(id).map_or(KeyParam::Unmatchable, KeyParam::Uuid),
            KeyColumn::Text | KeyColumn::Other => KeyParam::Text(id.to_string()),
        }
    }
}

pub struct PgFileRecordStore {
    pool: PgPool,
    table_name: String,
    table: String,
    key: OnceCell<KeyColumn>,
}

impl PgFileRecordStore {
    pub fn new(pool: PgPool, table_name: &str) -> Result<Self, StoreError> {
        Ok(Self {
            pool,
            table_name: table_name.to_string(),
            table: DatabaseManager::checked_identifier(table_name)?,
            key: OnceCell::new(),
        })
    }

    /// Type of the `id` column, looked up once per store
    async fn key_column(&self) -> Result<KeyColumn, StoreError> {
        let key = self
            .key
            .get_or_try_init(|| async {
                let data_type: Option<(String,)> = sqlx::query_as(
                    "SELECT data_type::text FROM information_schema.columns
                     WHERE table_schema = current_schema() AND table_name = $1 AND column_name = 'id'",
                )
                .bind(&self.table_name)
                .fetch_optional(&self.pool)
                .await?;

                let key = data_type.map_or(KeyColumn::Other, |(t,)| KeyColumn::from_data_type(&t));
                debug!(table = %self.table_name, ?key, "Resolved file id column type");
                Ok::<_, StoreError>(key)
            })
            .await?;

        Ok(*key)
    }
}

#[async_trait]
impl FileRecordStore for PgFileRecordStore {
    async fn snapshot(&self, id: &str) -> Result<Option<FileSnapshot>, StoreError> {
        let key = self.key_column().await?;
        let sql = format!(
            "SELECT metadata, updated_at FROM {} WHERE {}",
            self.table,
            key.predicate()
        );

        let query = sqlx::query(&sql);
        let query = match key.param(id) {
            KeyParam::Uuid(uuid) => query.bind(uuid),
            KeyParam::Text(text) => query.bind(text),
            KeyParam::Unmatchable => return Ok(None),
        };

        match query.fetch_optional(&self.pool).await? {
            Some(row) => {
                let metadata: Option<Value> = row.try_get("metadata")?;
                let updated_at: Option<DateTime<Utc>> = row.try_get("updated_at")?;
                Ok(Some(FileSnapshot::from_stored(metadata, updated_at)))
            }
            None => Ok(None),
        }
    }

    async fn apply_result(
        &self,
        id: &str,
        result: &ProcessingResult,
        expected: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError> {
        let key = self.key_column().await?;
        let sql = format!(
            "UPDATE {} SET extracted_text = $2, metadata = $3, thumbnail = $4, updated_at = $5
             WHERE {} AND updated_at IS NOT DISTINCT FROM $6",
            self.table,
            key.predicate()
        );

        let query = sqlx::query(&sql);
        let query = match key.param(id) {
            KeyParam::Uuid(uuid) => query.bind(uuid),
            KeyParam::Text(text) => query.bind(text),
            KeyParam::Unmatchable => return Ok(false),
        };

        let outcome = query
            .bind(result.extracted_text.as_deref())
            .bind(&result.metadata)
            .bind(result.thumbnail.as_deref())
            .bind(result.updated_at)
            .bind(expected)
            .execute(&self.pool)
            .await?;

        Ok(outcome.rows_affected() == 1)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
