//! # hashpoint CLI Module
//!
//! ## Available Commands
//!
//! - `resolve` - Resolve a JSON value through an entity
//! - `check` - Parse definitions and validate entity references
//! - `list` - List entity ids (default when no command is given)
//! - `show` - Print one entity's configuration
//! - `server` - Start the HTTP server

mod commands;

use clap::{Parser, Subcommand};
use hashpoint_core::HashpointError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// hashpoint - hash entity resolver
///
/// Applies declarative key-level edits (mapKeys, addKeys, omitKeys,
/// pickKeys, addValues, compose) to JSON objects.
#[derive(Parser, Debug)]
#[command(name = "hashpoint")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the entity definitions (`.json` for JSON, TOML otherwise)
    #[arg(short = 'd', long, global = true, default_value = "hashpoint.toml")]
    pub definitions: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a JSON value through an entity
    Resolve {
        /// Entity id, e.g. `hash:user`
        #[arg(short, long)]
        entity: String,

        /// Input JSON file (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Caller locals as a JSON document
        #[arg(long)]
        locals: Option<String>,
    },

    /// Parse definitions and validate entity references
    Check,

    /// List entity ids
    List,

    /// Print one entity's configuration as JSON
    Show {
        /// Entity id, e.g. `hash:user`
        #[arg(short, long)]
        entity: String,
    },

    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), HashpointError> {
    let options = OutputOptions {
        json_mode: cli.json_mode,
        verbose: cli.verbose,
    };
    let definitions = cli.definitions;

    match cli.command {
        Some(Commands::Resolve {
            entity,
            input,
            locals,
        }) => cmd_resolve(&definitions, options, &entity, input.as_deref(), locals.as_deref()).await,
        Some(Commands::Check) => cmd_check(&definitions, options),
        Some(Commands::Show { entity }) => cmd_show(&definitions, &entity),
        Some(Commands::Server { host, port }) => cmd_server(&definitions, &host, port).await,
        Some(Commands::List) | None => cmd_list(&definitions, options),
    }
}
