use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use detectgate::config::Config;
use detectgate::detection::gateway::ProviderGateway;
use detectgate::detection::traits::{Modality, Payload};
use detectgate::output::terminal;
use detectgate::report::DetectionReport;
use detectgate::validate::validate;

/// detectgate: rate-limited gateway for AI-content detection backends.
///
/// Routes text and image authenticity checks to the configured detector and
/// returns a normalized verdict.
#[derive(Parser)]
#[command(name = "detectgate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    #[cfg(feature = "web")]
    Serve {
        /// Address to listen on (overrides BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Check a piece of text once and print the verdict
    DetectText {
        /// The text to evaluate
        text: String,
    },

    /// Check an image file once and print the verdict
    DetectImage {
        /// Path to the image
        path: PathBuf,
    },

    /// Show the resolved configuration (secrets redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("detectgate=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load();

    match cli.command {
        #[cfg(feature = "web")]
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.bind_addr.clone());
            tracing::info!(
                window_ms = config.throttle.window.as_millis() as u64,
                max_requests = config.throttle.max_requests,
                "Throttle configured"
            );
            let service = detectgate::service::DetectionService::from_config(&config)?;
            detectgate::web::run_server(service, &bind).await?;
        }

        Commands::DetectText { text } => {
            let gateway = ProviderGateway::from_selection(&config.backends)?;
            run_once(&gateway, Payload::Text(&text), &text).await;
        }

        Commands::DetectImage { path } => {
            let image = std::fs::read(&path)
                .with_context(|| format!("Failed to read image {}", path.display()))?;
            let gateway = ProviderGateway::from_selection(&config.backends)?;
            run_once(&gateway, Payload::Image(&image), &path.display().to_string()).await;
        }

        Commands::Config => {
            terminal::display_config(&config);
        }
    }

    Ok(())
}

/// One-shot detection for the CLI: validate, detect, print. The throttle is
/// skipped since there is exactly one local caller.
async fn run_once(gateway: &ProviderGateway, payload: Payload<'_>, subject: &str) {
    let modality: Modality = payload.modality();
    let result = match validate(payload) {
        Ok(()) => gateway.detect(payload).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(verdict) => {
            terminal::display_report(&DetectionReport::from_verdict(modality, &verdict), subject)
        }
        Err(err) => {
            terminal::display_error(&err);
            std::process::exit(1);
        }
    }
}
