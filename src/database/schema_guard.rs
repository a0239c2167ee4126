use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};

use crate::database::manager::DatabaseManager;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Failed to inspect column {table}.{column}: {message}")]
    Inspect { table: String, column: String, message: String },

    #[error("Ambiguous schema state for {table}.{column}: {found} matching columns")]
    Ambiguous { table: String, column: String, found: i64 },

    #[error("Failed to add column {table}.{column}: {message}")]
    Alter { table: String, column: String, message: String },
}

/// Column types the guard is allowed to add
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Jsonb,
}

/// Column defaults the guard is allowed to set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    Null,
    /// `'{}'::jsonb` and NOT NULL; existing rows are backfilled with `{}`
    EmptyObject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: ColumnType,
    pub default: ColumnDefault,
}

/// The optional columns callback ingestion writes to
pub const FILE_RESULT_COLUMNS: [ColumnSpec; 2] = [
    ColumnSpec {
        name: "extracted_text",
        sql_type: ColumnType::Text,
        default: ColumnDefault::Null,
    },
    ColumnSpec {
        name: "metadata",
        sql_type: ColumnType::Jsonb,
        default: ColumnDefault::EmptyObject,
    },
];

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Jsonb => write!(f, "JSONB"),
        }
    }
}

impl ColumnSpec {
    /// `"name" TYPE [NOT NULL DEFAULT ..]` fragment for ADD COLUMN
    pub fn definition(&self) -> String {
        let column = DatabaseManager::quote_identifier(self.name);
        match self.default {
            ColumnDefault::Null => format!("{} {}", column, self.sql_type),
            ColumnDefault::EmptyObject => {
                format!("{} {} NOT NULL DEFAULT '{{}}'::jsonb", column, self.sql_type)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnStatus {
    pub column: String,
    pub already_present: bool,
}

/// Introspection and additive DDL against the live schema
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// Number of columns named `column` on `table` in the active schema
    async fn column_count(&self, table: &str, column: &str) -> Result<i64, SchemaError>;

    /// `ADD COLUMN IF NOT EXISTS`; must never touch existing columns or rows
    async fn add_column(&self, table: &str, spec: &ColumnSpec) -> Result<(), SchemaError>;
}

/// Establishes that optional columns exist before anything writes to them
#[derive(Clone)]
pub struct SchemaGuard {
    catalog: Arc<dyn SchemaCatalog>,
}

impl SchemaGuard {
    pub fn new(catalog: Arc<dyn SchemaCatalog>) -> Self {
        Self { catalog }
    }

    /// Make sure `spec` exists on `table`. Safe to repeat.
    pub async fn ensure_column(&self, table: &str, spec: &ColumnSpec) -> Result<ColumnStatus, SchemaError> {
        for name in [table, spec.name] {
            if !DatabaseManager::is_valid_identifier(name) {
                return Err(SchemaError::InvalidIdentifier(name.to_string()));
            }
        }

        let found = self.catalog.column_count(table, spec.name).await?;
        match found {
            1 => {
                debug!("Column '{}' already present on '{}'", spec.name, table);
                Ok(ColumnStatus { column: spec.name.to_string(), already_present: true })
            }
            0 => {
                self.catalog.add_column(table, spec).await?;
                info!("Added column '{}' ({}) to table '{}'", spec.name, spec.sql_type, table);
                Ok(ColumnStatus { column: spec.name.to_string(), already_present: false })
            }
            // Anything else is an answer we cannot act on
            other => Err(SchemaError::Ambiguous {
                table: table.to_string(),
                column: spec.name.to_string(),
                found: other,
            }),
        }
    }

    /// Ensure every column in [`FILE_RESULT_COLUMNS`], stopping at the first failure
    pub async fn ensure_file_columns(&self, table: &str) -> Result<Vec<ColumnStatus>, SchemaError> {
        let mut statuses = Vec::with_capacity(FILE_RESULT_COLUMNS.len());
        for spec in FILE_RESULT_COLUMNS.iter() {
            statuses.push(self.ensure_column(table, spec).await?);
        }
        Ok(statuses)
    }
}

/// Human-readable summary for admin responses and CLI output
pub fn describe_statuses(statuses: &[ColumnStatus]) -> String {
    let added: Vec<&str> = statuses.iter().filter(|s| !s.already_present).map(|s| s.column.as_str()).collect();
    let present: Vec<&str> = statuses.iter().filter(|s| s.already_present).map(|s| s.column.as_str()).collect();

    match (added.is_empty(), present.is_empty()) {
        (true, _) => format!("Columns already present: {}", present.join(", ")),
        (false, true) => format!("Added columns: {}", added.join(", ")),
        (false, false) => format!(
            "Added columns: {}; already present: {}",
            added.join(", "),
            present.join(", ")
        ),
    }
}

pub struct PgSchemaCatalog {
    pool: PgPool,
}

impl PgSchemaCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaCatalog for PgSchemaCatalog {
    async fn column_count(&self, table: &str, column: &str) -> Result<i64, SchemaError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM information_schema.columns
             WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2",
        )
        .bind(table)
        .bind(column)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SchemaError::Inspect {
            table: table.to_string(),
            column: column.to_string(),
            message: e.to_string(),
        })?;

        Ok(count.0)
    }

    async fn add_column(&self, table: &str, spec: &ColumnSpec) -> Result<(), SchemaError> {
        let ddl = format!(
            "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {}",
            DatabaseManager::quote_identifier(table),
            spec.definition()
        );

        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| SchemaError::Alter {
                table: table.to_string(),
                column: spec.name.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }
}
