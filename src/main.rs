use anyhow::Context;
use docflow_api::app::{self, AppState, Backends};
use docflow_api::config::AppConfig;
use docflow_api::database::{DatabaseManager, SchemaGuard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, N8N_WEBHOOK_URL, etc.
    let _ = dotenvy::dotenv();
    docflow_api::init_tracing();

    let config = AppConfig::from_env();
    tracing::info!("Starting docflow-api in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; every protected route will answer 401");
    }
    if config.n8n.webhook_url.is_none() {
        tracing::warn!("N8N_WEBHOOK_URL is not set; dispatch routes will answer 400");
    }

    let pool = DatabaseManager::connect_lazy(&config.database).context("failed to configure database pool")?;
    let backends = Backends::postgres(pool.clone(), &config).context("invalid table configuration")?;

    if config.database.migrate_on_start {
        let statuses = SchemaGuard::new(backends.catalog.clone())
            .ensure_file_columns(&config.database.files_table)
            .await
            .context("schema guard failed; run `docflow migrate` once the database is reachable")?;
        tracing::info!("{}", docflow_api::database::schema_guard::describe_statuses(&statuses));
    }

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let app = app::router(AppState::new(config, backends));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("docflow-api listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
