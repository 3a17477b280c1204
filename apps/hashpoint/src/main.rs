//! # hashpoint
//!
//! Command-line front end and HTTP server for hash entity resolution.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │          apps/hashpoint (THE BINARY)         │
//! │                                              │
//! │   ┌─────────────┐        ┌─────────────┐     │
//! │   │    CLI      │        │  HTTP API   │     │
//! │   │   (clap)    │        │   (axum)    │     │
//! │   └──────┬──────┘        └──────┬──────┘     │
//! │          └───────────┬──────────┘            │
//! │                      ▼                       │
//! │              ┌────────────────┐              │
//! │              │ hashpoint-core │              │
//! │              │  (THE LOGIC)   │              │
//! │              └────────────────┘              │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! hashpoint -d entities.toml check
//! hashpoint -d entities.toml resolve -e hash:user -i user.json
//! echo '{"name":"Ada"}' | hashpoint -q resolve -e hash:user
//! hashpoint -d entities.toml server --host 0.0.0.0 --port 8080
//! ```

use clap::Parser;
use hashpoint::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // HASHPOINT_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("HASHPOINT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hashpoint=info,tower_http=debug".into());

    // Logs go to stderr so resolved values on stdout stay pipeable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner to stderr.
fn print_banner() {
    eprintln!(
        r#"
  #  hashpoint v{}
  #  declarative key-level edits for JSON objects
"#,
        env!("CARGO_PKG_VERSION")
    );
}
