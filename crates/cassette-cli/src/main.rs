//! Cassette CLI - music generation client
//!
//! A command-line front end for the Cassette API: account and session
//! management, song creation and browsing, lyric generation and library
//! statistics.

mod commands;
mod output;

use std::sync::Arc;

use anyhow::Result;
use cassette_core::{AuthenticatedRequestClient, ClientConfig, Credentials, RequestExecutor, ReqwestTransport};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cassette")]
#[command(author, version, about = "Music generation client CLI", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: table (default) or json
    #[arg(long, global = true, default_value = "table")]
    format: output::OutputFormat,

    /// Suppress progress messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Server URL (or set CASSETTE_SERVER_URL env var)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Override credentials file path (or set CASSETTE_CREDENTIALS_PATH env var)
    #[arg(long, global = true)]
    credentials: Option<String>,

    /// Keep tokens in memory only; nothing is read from or written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Verbose logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, register, log out and inspect the session
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },

    /// View and edit your profile and LLM settings
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },

    /// Create, browse and manage songs
    Song {
        #[command(subcommand)]
        action: commands::song::SongAction,
    },

    /// Generate lyrics with the server's language model
    Lyrics {
        #[command(subcommand)]
        action: commands::lyrics::LyricsAction,
    },

    /// Inspect background generation tasks
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },

    /// Library statistics
    Library {
        #[command(subcommand)]
        action: commands::library::LibraryAction,
    },

    /// Check whether the server is reachable
    Server {
        #[command(subcommand)]
        action: commands::server::ServerAction,
    },

    /// Show the effective configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        output::print_error(&error_message(&err));
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig::resolve(cli.server.as_deref(), cli.credentials.as_deref())?;
    let client = if cli.ephemeral {
        let transport = ReqwestTransport::new(config.timeout)?;
        let executor = RequestExecutor::new(Arc::new(transport), config.api_base_url());
        AuthenticatedRequestClient::new(executor, Credentials::in_memory())
    } else {
        AuthenticatedRequestClient::from_config(&config)?
    };

    // Create context for commands
    let ctx = commands::Context {
        client,
        config,
        format: cli.format,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Auth { action } => commands::auth::execute(&ctx, action).await,
        Commands::Profile { action } => commands::profile::execute(&ctx, action).await,
        Commands::Song { action } => commands::song::execute(&ctx, action).await,
        Commands::Lyrics { action } => commands::lyrics::execute(&ctx, action).await,
        Commands::Task { action } => commands::task::execute(&ctx, action).await,
        Commands::Library { action } => commands::library::execute(&ctx, action).await,
        Commands::Server { action } => commands::server::execute(&ctx, action).await,
        Commands::Config { action } => commands::config::execute(&ctx, action).await,
    }
}

/// Message shown for a failed command
fn error_message(err: &anyhow::Error) -> String {
    let expired = match err.downcast_ref::<cassette_core::Error>() {
        Some(core) => core.is_session_expired(),
        None => err
            .downcast_ref::<cassette_core::ApiError>()
            .map(|api| api.is_session_expired())
            .unwrap_or(false),
    };

    if expired {
        "Session expired. Please log in again with `cassette auth login`.".to_string()
    } else {
        format!("Error: {:#}", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassette_core::ApiError;

    #[test]
    fn test_session_expired_message() {
        let err = anyhow::Error::new(ApiError::SessionExpired);
        assert!(error_message(&err).starts_with("Session expired. Please log in again"));

        let err = anyhow::Error::new(cassette_core::Error::Api(ApiError::SessionExpired));
        assert!(error_message(&err).starts_with("Session expired"));
    }

    #[test]
    fn test_other_errors_keep_their_message() {
        let err = anyhow::Error::new(ApiError::http(400, "title: This field is required."));
        assert_eq!(error_message(&err), "Error: title: This field is required.");
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::try_parse_from([
            "cassette", "song", "list", "--format", "json", "--server", "http://music.local", "-q",
        ])
        .unwrap();
        assert_eq!(cli.format, output::OutputFormat::Json);
        assert_eq!(cli.server.as_deref(), Some("http://music.local"));
        assert!(cli.quiet);
    }
}
