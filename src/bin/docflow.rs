use clap::Parser;
use docflow_api::cli::utils::unreported_message;
use docflow_api::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    docflow_api::init_tracing();

    let cli = Cli::parse();

    if let Err(e) = docflow_api::cli::run(cli).await {
        let verbose = matches!(std::env::var("CLI_VERBOSE").as_deref(), Ok("true") | Ok("1"));
        if let Some(message) = unreported_message(&e, verbose) {
            eprintln!("Error: {message}");
        }
        std::process::exit(1);
    }

    Ok(())
}
