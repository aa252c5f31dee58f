//! `mcp-toolbox`: sync MCP servers into typed wrappers and call their tools.
//!
//! # Commands
//!
//! - `sync`: introspect every configured server, diff, snapshot, regenerate
//! - `introspect`: introspect and record snapshots only
//! - `call`: invoke one tool through the pooled runtime
//! - `completions`: print a shell completion script

#![deny(unsafe_code)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use mcp_toolbox_cli::commands;
use mcp_toolbox_cli::commands::common::shutdown_signal;
use mcp_toolbox_cli::commands::sync::SyncOptions;
use mcp_toolbox_core::cli::{ExitCode, OutputFormat};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// MCP toolbox command-line interface.
#[derive(Parser, Debug)]
#[command(name = "mcp-toolbox")]
#[command(about = "Generate typed wrappers for MCP servers and call their tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, text, pretty)
    #[arg(long = "format", global = true, default_value = "pretty")]
    format: String,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync every configured server: introspect, diff, snapshot, regenerate.
    ///
    /// Exits with status 1 if any server fails, or with `--check` if any
    /// server is out of sync.
    Sync {
        /// Config file (default: $MCP_TOOLBOX_CONFIG or mcp-toolbox.config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory, overriding generation.outDir
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Do not list breaking changes in the summary
        #[arg(short, long)]
        yes: bool,

        /// Only compare schema fingerprints; write nothing
        #[arg(long)]
        check: bool,
    },

    /// Introspect servers and record snapshots without generating code.
    Introspect {
        /// Config file (default: $MCP_TOOLBOX_CONFIG or mcp-toolbox.config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory, overriding generation.outDir
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Only introspect this server
        #[arg(long)]
        server: Option<String>,
    },

    /// Call a tool on a configured server.
    Call {
        /// Server name as configured
        server: String,

        /// Tool name as reported by the server
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long)]
        input: Option<String>,

        /// Config file (default: $MCP_TOOLBOX_CONFIG or mcp-toolbox.config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::ERROR
        }
    };

    std::process::exit(exit_code.as_i32());
}

async fn run(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose);

    let output_format = cli.format.parse::<OutputFormat>()?;

    // `call` owns a connection pool and handles signals itself so it can
    // close the pool first.
    if matches!(cli.command, Commands::Call { .. }) {
        return execute_command(cli.command, output_format).await;
    }

    tokio::select! {
        result = execute_command(cli.command, output_format) => result,
        () = shutdown_signal() => {
            tracing::warn!("Interrupted");
            Ok(ExitCode::INTERRUPTED)
        }
    }
}

/// Installs the tracing subscriber: `RUST_LOG` (default `info`), `--verbose`
/// forces `debug`, output goes to stderr.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn execute_command(command: Commands, output_format: OutputFormat) -> Result<ExitCode> {
    match command {
        Commands::Sync {
            config,
            out_dir,
            yes,
            check,
        } => commands::sync::run(config, out_dir, SyncOptions { check, yes }, output_format).await,
        Commands::Introspect {
            config,
            out_dir,
            server,
        } => commands::introspect::run(config, out_dir, server, output_format).await,
        Commands::Call {
            server,
            tool,
            input,
            config,
        } => commands::call::run(server, tool, input, config, output_format).await,
        Commands::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            commands::completions::run(shell, &mut cmd).await
        }
    }
}
