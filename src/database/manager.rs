use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Connection pool construction and identifier hygiene for the Postgres backend
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open the pool described by `config`. Connections are established
    /// lazily so the server can start (and report a degraded /health) while
    /// the database is still coming up.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
        let url = Self::database_url(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(&url)?;

        info!(
            max_connections = config.max_connections,
            "Created database pool for {}",
            Self::redacted(&url)
        );
        Ok(pool)
    }

    /// Open the pool and verify connectivity immediately
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
        let pool = Self::connect_lazy(config)?;
        Self::health_check(&pool).await?;
        Ok(pool)
    }

    fn database_url(config: &DatabaseConfig) -> Result<String, StoreError> {
        let base = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let url = url::Url::parse(base).map_err(|_| StoreError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(url.into()),
            _ => Err(StoreError::InvalidDatabaseUrl),
        }
    }

    /// Strip credentials before a URL goes to the log
    fn redacted(raw: &str) -> String {
        match url::Url::parse(raw) {
            Ok(mut url) => {
                let _ = url.set_password(None);
                let _ = url.set_username("");
                url.into()
            }
            Err(_) => "<unparseable url>".to_string(),
        }
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Quote SQL identifier to prevent injection
    pub fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Validate table/column names that get interpolated into SQL. Accepts a
    /// leading ASCII letter or underscore followed by [a-zA-Z0-9_], at most
    /// 63 bytes (the Postgres identifier limit).
    pub fn is_valid_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Validate and quote in one step
    pub fn checked_identifier(name: &str) -> Result<String, StoreError> {
        if !Self::is_valid_identifier(name) {
            return Err(StoreError::InvalidIdentifier(name.to_string()));
        }
        Ok(Self::quote_identifier(name))
    }
}
