//! Server commands

use std::time::Duration;

use anyhow::Result;
use cassette_core::services::status::DEFAULT_WATCH_INTERVAL;
use cassette_core::{ServerState, StatusMonitor};
use clap::Subcommand;

use super::Context;
use crate::output::{print_info, print_success};

#[derive(Subcommand)]
pub enum ServerAction {
    /// Check once whether the server answers
    Check,

    /// Keep checking and report when the server goes up or down
    Watch {
        /// Seconds between checks
        #[arg(long, default_value_t = DEFAULT_WATCH_INTERVAL.as_secs())]
        interval: u64,
    },
}

pub async fn execute(ctx: &Context, action: ServerAction) -> Result<()> {
    let monitor = StatusMonitor::from_config(&ctx.config)?;

    match action {
        ServerAction::Check => match monitor.check().await {
            ServerState::Online => {
                print_success(&format!("Server is online ({})", ctx.config.server_url), ctx.quiet);
                Ok(())
            }
            state => anyhow::bail!("Server is {} ({})", state, ctx.config.server_url),
        },
        ServerAction::Watch { interval } => {
            print_info(
                &format!("Watching {} (Ctrl-C to stop)", monitor.probe_url()),
                ctx.quiet,
            );
            let mut rx = monitor.watch(Duration::from_secs(interval.max(1)));

            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = *rx.borrow_and_update();
                        let stamp = chrono::Local::now().format("%H:%M:%S");
                        match state {
                            ServerState::Online => print_success(&format!("[{}] online", stamp), false),
                            other => println!("[{}] {}", stamp, other),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            Ok(())
        }
    }
}
