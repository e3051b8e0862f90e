//! # Educa - E-Learning Server
//!
//! The main binary for the Educa course platform.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      apps/educa (THE BINARY)                    │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐     │
//! │  │   CLI       │    │   HTTP API  │    │   Chat hub       │     │
//! │  │  (clap)     │    │   (axum)    │    │  (ws+broadcast)  │     │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘     │
//! │         │                  │                    │               │
//! │         └──────────────────┼────────────────────┘               │
//! │                            ▼                                    │
//! │                    ┌───────────────┐                            │
//! │                    │  educa-core   │                            │
//! │                    │ (THE LOGIC)   │                            │
//! │                    └───────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the server
//! educa server --host 0.0.0.0 --port 8000
//!
//! # CLI operations
//! educa create-user --username ana --password s3cret-pass --role instructor
//! educa create-subject --title Mathematics
//! educa status
//! ```

use clap::Parser;
use educa::cli;
use educa::config::{LogFormat, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let config = match ServerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // EDUCA_LOG_FORMAT=json (or log_format = "json") enables machine-parseable output.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "educa=info,tower_http=debug".into());

    match config.log_format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli, config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Educa startup banner.
fn print_banner() {
    println!(
        r#"
  ███████╗██████╗ ██╗   ██╗ ██████╗ █████╗
  ██╔════╝██╔══██╗██║   ██║██╔════╝██╔══██╗
  █████╗  ██║  ██║██║   ██║██║     ███████║
  ██╔══╝  ██║  ██║██║   ██║██║     ██╔══██║
  ███████╗██████╔╝╚██████╔╝╚██████╗██║  ██║
  ╚══════╝╚═════╝  ╚═════╝  ╚═════╝╚═╝  ╚═╝

  E-Learning Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
