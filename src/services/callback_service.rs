use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::database::models::ProcessingResult;
use crate::database::{FileRecordStore, StoreError};

/// Merge-and-write attempts before a callback gives up on a contended row
pub const MAX_MERGE_ATTEMPTS: usize = 3;

/// Body n8n posts once processing of a file has finished
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub file_id: Option<String>,
    pub extracted_text: Option<String>,
    pub metadata: Option<Value>,
    pub thumbnail_url: Option<String>,
    pub processed: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{0}")]
    Validation(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Concurrent updates to file {0}; retry the callback")]
    Conflict(String),

    #[error("Failed to update file record: {0}")]
    Store(#[from] StoreError),
}

/// Applies n8n processing results to file records
#[derive(Clone)]
pub struct CallbackIngestion {
    files: Arc<dyn FileRecordStore>,
}

impl CallbackIngestion {
    pub fn new(files: Arc<dyn FileRecordStore>) -> Self {
        Self { files }
    }

    /// Validate, merge and store a callback. Returns the file id.
    pub async fn ingest(&self, payload: CallbackPayload) -> Result<String, IngestError> {
        let file_id = validate_file_id(payload.file_id.as_deref())?;
        let incoming = match payload.metadata {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(IngestError::Validation("metadata must be a JSON object".to_string())),
        };
        let processed = payload.processed.unwrap_or(true);

        for attempt in 1..=MAX_MERGE_ATTEMPTS {
            let snapshot = self
                .files
                .snapshot(&file_id)
                .await?
                .ok_or_else(|| IngestError::NotFound(file_id.clone()))?;

            let now = Utc::now();
            let result = ProcessingResult {
                extracted_text: payload.extracted_text.clone(),
                metadata: merge_metadata(snapshot.metadata, &incoming, processed, now),
                thumbnail: payload.thumbnail_url.clone(),
                updated_at: now,
            };

            if self.files.apply_result(&file_id, &result, snapshot.updated_at).await? {
                info!(
                    file_id = %file_id,
                    has_text = result.extracted_text.is_some(),
                    attempt,
                    "Stored processing result"
                );
                return Ok(file_id);
            }

            debug!(file_id = %file_id, attempt, "File changed since read; re-merging");
        }

        warn!(file_id = %file_id, "Giving up after {} contended merge attempts", MAX_MERGE_ATTEMPTS);
        Err(IngestError::Conflict(file_id))
    }
}

fn validate_file_id(file_id: Option<&str>) -> Result<String, IngestError> {
    let id = file_id.map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(IngestError::Validation("fileId is required".to_string()));
    }
    if id.chars().any(char::is_control) {
        return Err(IngestError::Validation("fileId contains control characters".to_string()));
    }
    Ok(id.to_string())
}

/// Shallow merge: top-level keys of `incoming` replace those in `existing`,
/// nested values are not merged. Processing flags are then forced.
pub fn merge_metadata(
    mut existing: Map<String, Value>,
    incoming: &Map<String, Value>,
    processed: bool,
    now: DateTime<Utc>,
) -> Value {
    for (key, value) in incoming {
        existing.insert(key.clone(), value.clone());
    }
    existing.insert("processed".to_string(), Value::Bool(processed));
    existing.insert("needsProcessing".to_string(), Value::Bool(false));
    existing.insert(
        "updatedAt".to_string(),
        Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    Value::Object(existing)
}
