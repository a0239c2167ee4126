use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_error, output_success, ReportedError};
use crate::cli::{CommandContext, OutputFormat};
use crate::services::{DispatchError, DispatchPayload, TokenService, WebhookDispatcher};

#[derive(Subcommand)]
pub enum WebhookCommands {
    #[command(about = "Send a small test file to the n8n webhook")]
    Test {
        #[arg(long, help = "Webhook URL (defaults to N8N_WEBHOOK_URL)")]
        url: Option<String>,
    },
}

pub async fn handle(cmd: WebhookCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        WebhookCommands::Test { url } => {
            let ctx = CommandContext::connect().await?;
            let dispatcher = WebhookDispatcher::new(&ctx.config.n8n);
            let endpoint = match url {
                Some(url) => url,
                None => dispatcher.endpoint()?.to_string(),
            };

            let token = TokenService::new(ctx.backends.credentials.clone()).current_token().await?;
            send_test(&dispatcher, &endpoint, &token, output_format).await
        }
    }
}

async fn send_test(
    dispatcher: &WebhookDispatcher,
    endpoint: &str,
    token: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match dispatcher.send(DispatchPayload::connectivity_test(), endpoint, token).await {
        Ok(response) => output_success(
            output_format,
            &format!("n8n accepted the test payload ({})", response.status),
            Some(json!({ "status": response.status, "body": response.body })),
        ),
        Err(err) => {
            let message = match &err {
                DispatchError::RemoteRejected { body, .. } => format!("{}: {}", err, body),
                _ => err.to_string(),
            };
            output_error(output_format, &message, Some(error_code(&err)))?;
            Err(ReportedError(message).into())
        }
    }
}

fn error_code(err: &DispatchError) -> &'static str {
    match err {
        DispatchError::NotConfigured => "NOT_CONFIGURED",
        DispatchError::RemoteRejected { .. } => "REMOTE_REJECTED",
        DispatchError::NoResponse { .. } => "NO_RESPONSE",
        DispatchError::SetupFailure { .. } => "SETUP_FAILURE",
    }
}
