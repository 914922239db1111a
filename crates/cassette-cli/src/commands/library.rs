//! Library commands

use anyhow::Result;
use cassette_core::LibraryStats;
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;

use super::Context;
use crate::output::{print_output, print_record, OutputFormat};

#[derive(Subcommand)]
pub enum LibraryAction {
    /// Song counts, plays and votes across your library
    Stats,
}

/// Stat row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct StatRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

fn stat_rows(stats: &LibraryStats) -> Vec<StatRow> {
    let row = |metric: &str, value: String| StatRow {
        metric: metric.to_string(),
        value,
    };

    let mut rows = vec![
        row("Total songs", stats.total_songs.to_string()),
        row("Completed", stats.completed_songs.to_string()),
        row("Generating", stats.generating_songs.to_string()),
        row("Failed", stats.failed_songs.to_string()),
        row("Published", stats.published_songs.to_string()),
        row("Total plays", stats.total_plays.to_string()),
        row("Total upvotes", stats.total_upvotes.to_string()),
    ];
    for genre in &stats.genres {
        rows.push(row(&format!("Genre: {}", genre.genre), genre.count.to_string()));
    }
    rows
}

pub async fn execute(ctx: &Context, action: LibraryAction) -> Result<()> {
    match action {
        LibraryAction::Stats => {
            let stats = ctx.client.library_stats().await?;
            match ctx.format {
                OutputFormat::Json => print_record(&stats, ctx.format),
                OutputFormat::Table => print_output(&stat_rows(&stats), ctx.format),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassette_core::GenreCount;

    #[test]
    fn test_stat_rows_include_genres() {
        let stats = LibraryStats {
            total_songs: 3,
            genres: vec![GenreCount {
                genre: "jazz".to_string(),
                count: 2,
            }],
            ..LibraryStats::default()
        };
        let rows = stat_rows(&stats);
        assert_eq!(rows[0].value, "3");
        assert_eq!(rows.last().unwrap().metric, "Genre: jazz");
        assert_eq!(rows.len(), 8);
    }
}
