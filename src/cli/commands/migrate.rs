use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{CommandContext, OutputFormat};
use crate::database::schema_guard::describe_statuses;
use crate::database::SchemaGuard;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let ctx = CommandContext::connect().await?;
    let table = &ctx.config.database.files_table;

    let statuses = SchemaGuard::new(ctx.backends.catalog.clone())
        .ensure_file_columns(table)
        .await?;

    output_success(
        output_format,
        &describe_statuses(&statuses),
        Some(json!({ "table": table, "columns": statuses })),
    )
}
