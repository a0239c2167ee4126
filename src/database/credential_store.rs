use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::manager::{DatabaseManager, StoreError};
use crate::database::models::Secret;

/// Key-value secret storage
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<Secret>, StoreError>;

    /// Insert or replace the value for `name` in a single statement
    async fn upsert(&self, name: &str, value: &str) -> Result<(), StoreError>;
}

pub struct PgCredentialStore {
    pool: PgPool,
    table: String,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool, table_name: &str) -> Result<Self, StoreError> {
        Ok(Self {
            pool,
            table: DatabaseManager::checked_identifier(table_name)?,
        })
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn get(&self, name: &str) -> Result<Option<Secret>, StoreError> {
        let sql = format!(
            "SELECT name, value, updated_at FROM {} WHERE name = $1",
            self.table
        );

        let secret = sqlx::query_as::<_, Secret>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(secret)
    }

    async fn upsert(&self, name: &str, value: &str) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} (name, value, updated_at) VALUES ($1, $2, NOW())
             ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at",
            self.table
        );

        sqlx::query(&sql)
            .bind(name)
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
