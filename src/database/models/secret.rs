use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named secret. At most one row exists per `name`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Secret {
    pub name: String,
    #[serde(skip_serializing)]
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
