// handlers/protected/mod.rs - Protected handlers (session JWT required)
//
// Route Prefix: /api/admin/*, /api/webhooks/n8n/test, /api/files/*
// Middleware: JWT validation, injecting AuthUser

pub mod admin;
pub mod files;
pub mod n8n;

pub use admin::schema_ensure;
pub use files::file_dispatch;
pub use n8n::{token_get, token_rotate, webhook_test};
