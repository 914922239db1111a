//! Config commands
//!
//! Shows the configuration the CLI is running with.

use anyhow::Result;
use cassette_core::config::{ConfigSource, ENV_TIMEOUT_SECS};
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;

use super::Context;
use crate::output::print_output;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
}

/// Config row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

pub async fn execute(ctx: &Context, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => print_output(&config_rows(ctx), ctx.format),
    }
}

fn config_rows(ctx: &Context) -> Vec<ConfigRow> {
    let config = &ctx.config;
    let timeout_source = if std::env::var(ENV_TIMEOUT_SECS).is_ok() {
        ConfigSource::Env
    } else {
        ConfigSource::Default
    };

    vec![
        ConfigRow {
            key: "server_url".to_string(),
            value: config.server_url.clone(),
            source: config.server_url_source.to_string(),
        },
        ConfigRow {
            key: "api_base_url".to_string(),
            value: config.api_base_url(),
            source: config.server_url_source.to_string(),
        },
        ConfigRow {
            key: "timeout_secs".to_string(),
            value: config.timeout.as_secs().to_string(),
            source: timeout_source.to_string(),
        },
        ConfigRow {
            key: "credentials_path".to_string(),
            value: config.credentials_path.to_string_lossy().to_string(),
            source: config.credentials_path_source.to_string(),
        },
        ConfigRow {
            key: "logged_in".to_string(),
            value: ctx.client.is_authenticated().to_string(),
            source: "credentials".to_string(),
        },
    ]
}
