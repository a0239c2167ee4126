pub mod schema;

pub use schema::schema_ensure;
