//! EduConnect - face-login chat client
//!
#![doc = "EduConnect - face-login chat client"]
#![doc = "Main entry point for the EduConnect command-line client."]

use std::path::Path;

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use educonnect::cli::{Cli, Commands};
use educonnect::commands;
use educonnect::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config_found = Path::new(config_path).exists();
    let config = Config::load(config_path, &cli)?;

    // Initialize tracing once the log format is known
    init_tracing(cli.verbose, config.logging.json);
    if !config_found {
        tracing::warn!("Config file not found at {}, using defaults", config_path);
    }

    // Validate configuration
    config.validate()?;
    tracing::debug!("Using API base URL: {}", config.api.base_url);

    // Execute command
    match cli.command {
        Commands::Login { image } => {
            tracing::info!("Starting login");
            commands::login::run_login(config, &image).await?;
            Ok(())
        }
        Commands::Whoami => {
            commands::session::whoami(config)?;
            Ok(())
        }
        Commands::Send { text } => {
            tracing::debug!("Sending one message ({} chars)", text.len());
            commands::chat::run_send(config, &text).await?;
            Ok(())
        }
        Commands::History => {
            commands::chat::run_history(config).await?;
            Ok(())
        }
        Commands::Upload { file } => {
            tracing::info!("Uploading {}", file.display());
            commands::chat::run_upload(config, &file).await?;
            Ok(())
        }
        Commands::Logout => {
            tracing::info!("Starting logout");
            commands::session::run_logout(config).await?;
            Ok(())
        }
        Commands::Chat => {
            // Moves `config` into the handler (match arms are exclusive)
            commands::chat::run_chat(config).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output for
/// this crate. Logs go to stderr so command output stays clean.
fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "educonnect=debug"
    } else {
        "educonnect=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
