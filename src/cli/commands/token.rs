use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{CommandContext, OutputFormat};
use crate::services::token_service::{fingerprint, DEFAULT_INSECURE_TOKEN};
use crate::services::TokenService;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Print the current n8n token")]
    Show,

    #[command(about = "Generate and store a new n8n token")]
    Rotate,
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let ctx = CommandContext::connect().await?;
    let tokens = TokenService::new(ctx.backends.credentials.clone());

    match cmd {
        TokenCommands::Show => {
            let token = tokens.current_token().await?;
            let message = if token == DEFAULT_INSECURE_TOKEN {
                "No token stored; n8n is using the default insecure token. Run `docflow token rotate`.".to_string()
            } else {
                format!("Current token (fingerprint {})", fingerprint(&token))
            };
            output_success(output_format, &message, Some(json!({ "token": token })))?;
            if matches!(output_format, OutputFormat::Text) {
                println!("{}", token);
            }
            Ok(())
        }
        TokenCommands::Rotate => {
            let token = tokens.issue_new_token().await?;
            output_success(
                output_format,
                &format!("New token stored (fingerprint {})", fingerprint(&token)),
                Some(json!({ "token": token })),
            )?;
            if matches!(output_format, OutputFormat::Text) {
                println!("{}", token);
            }
            Ok(())
        }
    }
}
