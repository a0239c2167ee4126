use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::database::{
    CredentialStore, FileRecordStore, PgCredentialStore, PgFileRecordStore, PgSchemaCatalog, SchemaCatalog,
    SchemaGuard, StoreError,
};
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, n8n_callback_token_middleware};
use crate::services::{CallbackIngestion, TokenService, WebhookDispatcher};

/// The storage backends every service is built on
#[derive(Clone)]
pub struct Backends {
    pub credentials: Arc<dyn CredentialStore>,
    pub files: Arc<dyn FileRecordStore>,
    pub catalog: Arc<dyn SchemaCatalog>,
}

impl Backends {
    pub fn postgres(pool: PgPool, config: &AppConfig) -> Result<Self, StoreError> {
        Ok(Self {
            credentials: Arc::new(PgCredentialStore::new(pool.clone(), &config.database.secrets_table)?),
            files: Arc::new(PgFileRecordStore::new(pool.clone(), &config.database.files_table)?),
            catalog: Arc::new(PgSchemaCatalog::new(pool)),
        })
    }
}

/// Shared, cheaply clonable handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub files: Arc<dyn FileRecordStore>,
    pub tokens: TokenService,
    pub ingestion: CallbackIngestion,
    pub schema: SchemaGuard,
    pub dispatcher: WebhookDispatcher,
}

impl AppState {
    pub fn new(config: AppConfig, backends: Backends) -> Self {
        let dispatcher = WebhookDispatcher::new(&config.n8n);
        Self {
            files: backends.files.clone(),
            tokens: TokenService::new(backends.credentials),
            ingestion: CallbackIngestion::new(backends.files),
            schema: SchemaGuard::new(backends.catalog),
            dispatcher,
            config: Arc::new(config),
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: WebhookDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config);

    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Callbacks from n8n
        .merge(n8n_callback_routes(state.clone()))
        // Protected API
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors);

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn n8n_callback_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/webhooks/n8n/callback", post(public::n8n_callback))
        .route_layer(from_fn_with_state(state, n8n_callback_token_middleware))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/n8n/token",
            get(protected::token_get).post(protected::token_rotate),
        )
        .route("/api/admin/schema/ensure", post(protected::schema_ensure))
        .route("/api/webhooks/n8n/test", post(protected::webhook_test))
        .route("/api/files/:id/dispatch", post(protected::file_dispatch))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.is_development() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
