//! CLI commands module
//!
//! Contains all CLI command implementations.

pub mod auth;
pub mod config;
pub mod library;
pub mod lyrics;
pub mod profile;
pub mod server;
pub mod song;
pub mod task;

use cassette_core::{AuthenticatedRequestClient, ClientConfig};

use crate::output::OutputFormat;

/// Shared context for all commands
pub struct Context {
    pub client: AuthenticatedRequestClient,
    pub config: ClientConfig,
    pub format: OutputFormat,
    pub quiet: bool,
}
