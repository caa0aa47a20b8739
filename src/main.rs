//! Describo - chat with a multimodal model about an image
//!
#![doc = "Describo - chat with a multimodal model about an image"]
#![doc = "Main entry point for the Describo application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use describo::cli::{Cli, Commands};
use describo::commands;
use describo::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { image, model } => {
            if let Some(m) = &model {
                tracing::debug!("Using model override: {}", m);
            }
            if let Some(path) = &image {
                tracing::debug!("Staging image from: {}", path.display());
            }
            commands::chat::run_chat(config, image).await?;
            Ok(())
        }
        Commands::Ask {
            image,
            prompt,
            model,
        } => {
            if let Some(m) = &model {
                tracing::debug!("Using model override: {}", m);
            }
            commands::ask::run_ask(config, &image, &prompt).await?;
            Ok(())
        }
        Commands::Check { path } => {
            tracing::info!("Checking image {}", path.display());
            commands::check::run_check(&config, &path)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so they never interleave with streamed answers.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "describo=debug" } else { "describo=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
