///
/// This module implements the CLI interface for funcli: command parsing,
/// argument validation, and the async entrypoint used by `main` and tests.
///
/// All import logic (scanning, manifests, resumable sessions, uploads and
/// progress polling) lives in the [`funcli-core`] crate. This module only
/// resolves configuration, builds the HTTP client and renders results.
///
/// ## How To Use
/// - For command-line users: `funcli import --help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`funcli-core`]: ../../funcli-core/
use crate::client::FundamentoClient;
use crate::load_config::load_config;
use crate::render::{format_log, format_log_json, format_status, ConsoleReporter};
use anyhow::Result;
use clap::{Parser, Subcommand};
use funcli_core::config::DEFAULT_CONCURRENCY;
use funcli_core::contract::SourceFormat;
use funcli_core::transfer::HttpTransfer;
use funcli_core::{ImportOptions, ImportSessionManager, StartOptions};
use std::path::PathBuf;

/// CLI client for Fundamento Cloud.
#[derive(Parser, Debug)]
#[clap(name = "funcli", version, about = "CLI client for Fundamento Cloud")]
pub struct Cli {
    /// API token (overrides FUNDAMENTO_API_KEY)
    #[clap(short = 't', long, global = true)]
    pub token: Option<String>,

    /// Base URL (default: https://fundamento.cloud)
    #[clap(short = 'u', long, global = true)]
    pub base_url: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bulk-import a local directory into a space
    Import {
        #[clap(subcommand)]
        command: ImportCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ImportCommands {
    /// Import a directory, resuming a previous run when a session file exists
    Start {
        /// Target space id
        space: String,
        /// Directory to import
        directory: PathBuf,
        /// Source format (generic|obsidian); detected from the directory when omitted
        #[clap(long)]
        format: Option<SourceFormat>,
        /// Session file location (default: <directory>/.fundamento-session.json)
        #[clap(long)]
        session_file: Option<PathBuf>,
        /// Wildcard pattern of file or directory names to skip; repeatable
        #[clap(long = "ignore", value_name = "PATTERN")]
        ignore: Vec<String>,
        /// Concurrent uploads
        #[clap(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
    /// Show the status of an import session
    Status { session_id: String },
    /// Cancel an import session
    Cancel { session_id: String },
    /// Retry the failed files of an import session
    Retry { session_id: String },
    /// List the files of an import session
    Log {
        session_id: String,
        /// Only show files that failed
        #[clap(long)]
        failed_only: bool,
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = load_config(cli.token, cli.base_url)?;
    let client = FundamentoClient::new(&config)?;

    match cli.command {
        Commands::Import { command } => run_import(client, command).await,
    }
}

async fn run_import(client: FundamentoClient, command: ImportCommands) -> Result<()> {
    match command {
        ImportCommands::Start {
            space,
            directory,
            format,
            session_file,
            ignore,
            concurrency,
        } => {
            tracing::info!(command = "import start", space = %space, directory = %directory.display(), "Starting import");
            let options = ImportOptions {
                concurrency,
                ignore,
                ..Default::default()
            };
            let manager = ImportSessionManager::new(client, HttpTransfer::new(), options)
                .with_reporter(ConsoleReporter);
            match manager
                .start(&space, &directory, StartOptions { format, session_file })
                .await
            {
                Ok(outcome) => {
                    tracing::info!(
                        command = "import start",
                        session_id = %outcome.session_id,
                        resumed = outcome.resumed,
                        uploaded = outcome.uploaded,
                        status = %outcome.session.status,
                        "Import finished"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "import start", error = %e, "Import failed");
                    Err(e.into())
                }
            }
        }
        ImportCommands::Status { session_id } => {
            let session = manager(client).status(&session_id).await?;
            println!("{}", format_status(&session_id, &session));
            Ok(())
        }
        ImportCommands::Cancel { session_id } => {
            manager(client).cancel(&session_id).await?;
            println!("Session {session_id} cancelled.");
            Ok(())
        }
        ImportCommands::Retry { session_id } => {
            let session = manager(client)
                .with_reporter(ConsoleReporter)
                .retry(&session_id)
                .await?;
            tracing::info!(command = "import retry", session_id = %session_id, status = %session.status, "Retry finished");
            Ok(())
        }
        ImportCommands::Log {
            session_id,
            failed_only,
            json,
        } => {
            let files = manager(client).log(&session_id, failed_only).await?;
            if json {
                println!("{}", format_log_json(&files)?);
            } else {
                println!("{}", format_log(&session_id, &files));
            }
            Ok(())
        }
    }
}

/// Manager for commands that act on a session by id.
fn manager(client: FundamentoClient) -> ImportSessionManager<FundamentoClient, HttpTransfer> {
    ImportSessionManager::new(client, HttpTransfer::new(), ImportOptions::default())
}
