pub mod credential_store;
pub mod file_store;
pub mod manager;
pub mod models;
pub mod schema_guard;

pub use credential_store::{CredentialStore, PgCredentialStore};
pub use file_store::{FileRecordStore, PgFileRecordStore};
pub use manager::{DatabaseManager, StoreError};
pub use schema_guard::{ColumnStatus, SchemaCatalog, SchemaError, SchemaGuard, PgSchemaCatalog};
