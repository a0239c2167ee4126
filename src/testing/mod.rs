//! In-process backends for exercising services and routes without Postgres.
//!
//! Each store mirrors the semantics its Postgres counterpart relies on
//! (upsert-by-name, conditional update on `updated_at`, additive columns) and
//! can be told to fail so error paths are reachable from tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::app::{AppState, Backends};
use crate::auth::{generate_jwt, Claims};
use crate::config::{AppConfig, Environment};
use crate::database::models::{FileRecord, FileSnapshot, ProcessingResult, Secret};
use crate::database::schema_guard::{ColumnSpec, SchemaCatalog, SchemaError};
use crate::database::{CredentialStore, FileRecordStore, StoreError};

pub const TEST_JWT_SECRET: &str = "docflow-test-secret";

fn injected(slot: &Mutex<Option<String>>) -> Result<(), StoreError> {
    match slot.lock().map(|guard| guard.clone()) {
        Ok(Some(message)) => Err(StoreError::Unavailable(message)),
        _ => Ok(()),
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    secrets: RwLock<HashMap<String, Secret>>,
    read_failure: Mutex<Option<String>>,
    write_failure: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn fail_reads(&self, message: &str) {
        if let Ok(mut slot) = self.read_failure.lock() {
            *slot = Some(message.to_string());
        }
    }

    pub fn fail_writes(&self, message: &str) {
        if let Ok(mut slot) = self.write_failure.lock() {
            *slot = Some(message.to_string());
        }
    }

    pub async fn row_count(&self) -> usize {
        self.secrets.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, name: &str) -> Result<Option<Secret>, StoreError> {
        injected(&self.read_failure)?;
        Ok(self.secrets.read().await.get(name).cloned())
    }

    async fn upsert(&self, name: &str, value: &str) -> Result<(), StoreError> {
        injected(&self.write_failure)?;
        let secret = Secret {
            name: name.to_string(),
            value: value.to_string(),
            updated_at: Utc::now(),
        };
        self.secrets.write().await.insert(name.to_string(), secret);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryFileStore {
    records: RwLock<HashMap<String, FileRecord>>,
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
    interleaved: AtomicUsize,
    interleaved_metadata: Mutex<Map<String, Value>>,
}

impl MemoryFileStore {
    pub async fn insert(&self, record: FileRecord) {
        self.records.write().await.insert(record.id.clone(), record);
    }

    pub async fn get(&self, id: &str) -> Option<FileRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Number of backend calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, message: &str) {
        if let Ok(mut slot) = self.failure.lock() {
            *slot = Some(message.to_string());
        }
    }

    /// Simulate another writer landing between the next `times` reads and
    /// their conditional writes: each such write first merges `metadata` into
    /// the row, bumps `updated_at`, and then loses the race.
    pub fn interleave_writes(&self, times: usize, metadata: Map<String, Value>) {
        self.interleaved.store(times, Ordering::SeqCst);
        if let Ok(mut slot) = self.interleaved_metadata.lock() {
            *slot = metadata;
        }
    }

    fn take_interleaved(&self) -> Option<Map<String, Value>> {
        let claimed = self
            .interleaved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !claimed {
            return None;
        }
        self.interleaved_metadata.lock().map(|m| m.clone()).ok()
    }
}

#[async_trait]
impl FileRecordStore for MemoryFileStore {
    async fn snapshot(&self, id: &str) -> Result<Option<FileSnapshot>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        injected(&self.failure)?;
        Ok(self
            .records
            .read()
            .await
            .get(id)
            .map(|r| FileSnapshot::from_stored(Some(r.metadata.clone()), r.updated_at)))
    }

    async fn apply_result(
        &self,
        id: &str,
        result: &ProcessingResult,
        expected: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        injected(&self.failure)?;

        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(id) else {
            return Ok(false);
        };

        if let Some(concurrent) = self.take_interleaved() {
            if let Value::Object(map) = &mut record.metadata {
                map.extend(concurrent);
            }
            record.updated_at = Some(record.updated_at.unwrap_or_else(Utc::now) + Duration::milliseconds(1));
        }

        if record.updated_at != expected {
            return Ok(false);
        }

        record.extracted_text = result.extracted_text.clone();
        record.metadata = result.metadata.clone();
        record.thumbnail = result.thumbnail.clone();
        record.updated_at = Some(result.updated_at);
        Ok(true)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        injected(&self.failure)
    }
}

#[derive(Default)]
pub struct MemorySchemaCatalog {
    tables: RwLock<HashMap<String, BTreeSet<String>>>,
    forced_count: AtomicI64,
    inspects: AtomicUsize,
    alters: AtomicUsize,
}

impl MemorySchemaCatalog {
    pub fn with_table(table: &str, columns: &[&str]) -> Self {
        let mut tables = HashMap::new();
        tables.insert(table.to_string(), columns.iter().map(|c| c.to_string()).collect());
        Self {
            tables: RwLock::new(tables),
            ..Default::default()
        }
    }

    /// Make `column_count` return `count` (when positive) regardless of actual state
    pub fn force_count(&self, count: i64) {
        self.forced_count.store(count, Ordering::SeqCst);
    }

    pub async fn columns(&self, table: &str) -> Vec<String> {
        self.tables
            .read()
            .await
            .get(table)
            .map(|cols| cols.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn inspect_count(&self) -> usize {
        self.inspects.load(Ordering::SeqCst)
    }

    pub fn alter_count(&self) -> usize {
        self.alters.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaCatalog for MemorySchemaCatalog {
    async fn column_count(&self, table: &str, column: &str) -> Result<i64, SchemaError> {
        self.inspects.fetch_add(1, Ordering::SeqCst);
        let forced = self.forced_count.load(Ordering::SeqCst);
        if forced > 0 {
            return Ok(forced);
        }
        let tables = self.tables.read().await;
        Ok(tables.get(table).map_or(0, |cols| cols.contains(column) as i64))
    }

    async fn add_column(&self, table: &str, spec: &ColumnSpec) -> Result<(), SchemaError> {
        self.alters.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.write().await;
        let columns = tables.get_mut(table).ok_or_else(|| SchemaError::Alter {
            table: table.to_string(),
            column: spec.name.to_string(),
            message: format!("relation \"{}\" does not exist", table),
        })?;
        columns.insert(spec.name.to_string());
        Ok(())
    }
}

/// Handles on the in-memory backends behind a test [`AppState`]
#[derive(Clone)]
pub struct TestBackends {
    pub credentials: Arc<MemoryCredentialStore>,
    pub files: Arc<MemoryFileStore>,
    pub catalog: Arc<MemorySchemaCatalog>,
}

impl Default for TestBackends {
    fn default() -> Self {
        Self {
            credentials: Arc::new(MemoryCredentialStore::default()),
            files: Arc::new(MemoryFileStore::default()),
            catalog: Arc::new(MemorySchemaCatalog::with_table("files", &["id", "thumbnail", "updated_at"])),
        }
    }
}

impl TestBackends {
    pub fn backends(&self) -> Backends {
        Backends {
            credentials: self.credentials.clone(),
            files: self.files.clone(),
            catalog: self.catalog.clone(),
        }
    }
}

/// Development preset with a known JWT secret and no n8n endpoint
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::for_environment(Environment::Development);
    config.security.jwt_secret = TEST_JWT_SECRET.to_string();
    config.n8n.webhook_url = None;
    config
}

pub fn test_state(config: AppConfig) -> (AppState, TestBackends) {
    let backends = TestBackends::default();
    (AppState::new(config, backends.backends()), backends)
}

/// A valid session JWT for [`TEST_JWT_SECRET`]
pub fn session_token(user_id: &str) -> String {
    generate_jwt(&Claims::new(user_id, None, 1), TEST_JWT_SECRET).unwrap_or_default()
}
