//! Task commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;

use super::Context;
use crate::output::{display_value, print_single, truncate};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Show the state of a background task
    Status {
        /// Task ID
        id: String,
    },
}

/// Task row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct TaskRow {
    #[tabled(rename = "Task")]
    pub task_id: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Message")]
    pub message: String,
    #[tabled(rename = "Result")]
    pub result: String,
}

pub async fn execute(ctx: &Context, action: TaskAction) -> Result<()> {
    match action {
        TaskAction::Status { id } => {
            let task = ctx.client.task_status(&id).await?;
            let message = task
                .error
                .clone()
                .or_else(|| task.message.clone())
                .unwrap_or_else(|| "-".to_string());
            let row = TaskRow {
                task_id: task.task_id,
                status: task.status,
                message,
                result: task
                    .result
                    .as_ref()
                    .map(|r| truncate(&display_value(r), 60))
                    .unwrap_or_else(|| "-".to_string()),
            };
            print_single(&row, ctx.format)
        }
    }
}
