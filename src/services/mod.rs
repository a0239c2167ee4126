pub mod callback_service;
pub mod token_service;
pub mod webhook_dispatch;

pub use callback_service::{CallbackIngestion, CallbackPayload, IngestError};
pub use token_service::{TokenError, TokenService, DEFAULT_INSECURE_TOKEN, N8N_TOKEN_NAME};
pub use webhook_dispatch::{DispatchError, DispatchPayload, DispatchResponse, WebhookDispatcher};
