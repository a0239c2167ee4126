use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The columns of an uploaded file that processing callbacks touch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub extracted_text: Option<String>,
    pub metadata: Value,
    pub thumbnail: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// A freshly uploaded file awaiting processing
    pub fn pending(id: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            extracted_text: None,
            metadata: Value::Object(metadata),
            thumbnail: None,
            updated_at: Some(Utc::now()),
        }
    }
}

/// What a merge reads before writing: current metadata plus the version
/// stamp the write is conditioned on.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSnapshot {
    pub metadata: Map<String, Value>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FileSnapshot {
    /// Stored metadata that is NULL or not an object reads as `{}`
    pub fn from_stored(metadata: Option<Value>, updated_at: Option<DateTime<Utc>>) -> Self {
        let metadata = match metadata {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self { metadata, updated_at }
    }
}

/// Column values written back by callback ingestion
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub extracted_text: Option<String>,
    pub metadata: Value,
    pub thumbnail: Option<String>,
    pub updated_at: DateTime<Utc>,
}
