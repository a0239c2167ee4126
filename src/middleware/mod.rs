pub mod auth;

pub use auth::{jwt_auth_middleware, n8n_callback_token_middleware, AuthUser};
