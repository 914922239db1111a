//! Song commands
//!
//! Browse, create and manage songs.

use std::time::Duration;

use anyhow::Result;
use cassette_core::services::song_poll::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use cassette_core::{
    CreateSongRequest, LyricsRequest, PollConfig, PublishAction, Song, SongPoller, SongQuery,
    SongStatus, SongUpdate, VoteType,
};
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;

use super::Context;
use crate::output::{print_info, print_output, print_record, print_success, truncate, OutputFormat};

#[derive(Subcommand)]
pub enum SongAction {
    /// List public songs, or your own with --mine
    List {
        /// Search title, lyrics and description
        #[arg(long)]
        search: Option<String>,

        /// Filter by genre (repeatable)
        #[arg(long)]
        genre: Vec<String>,

        /// Filter by mood (repeatable)
        #[arg(long)]
        mood: Vec<String>,

        /// Sort field, prefix with - for descending (created_at, upvotes, play_count, title)
        #[arg(long, default_value = "-created_at")]
        ordering: String,

        /// Only your songs, in any state
        #[arg(long)]
        mine: bool,

        /// Page number
        #[arg(long)]
        page: Option<u32>,

        /// Minimum duration in seconds
        #[arg(long)]
        min_duration: Option<u32>,

        /// Maximum duration in seconds
        #[arg(long)]
        max_duration: Option<u32>,

        /// Minimum vote score
        #[arg(long, allow_hyphen_values = true)]
        min_score: Option<i64>,
    },

    /// Show one song
    Show {
        /// Song ID
        id: i64,
    },

    /// Create a song and start generating it
    Create {
        /// Song title
        title: String,

        /// Genre (pop, rock, jazz, classical, electronic, hiphop, ...)
        #[arg(long, default_value = "pop")]
        genre: String,

        /// Mood (happy, sad, energetic, calm, ...)
        #[arg(long, default_value = "")]
        mood: String,

        /// Lyrics text
        #[arg(long, conflicts_with = "generate_lyrics")]
        lyrics: Option<String>,

        /// Ask the server to write lyrics first
        #[arg(long)]
        generate_lyrics: bool,

        /// Description
        #[arg(long, default_value = "")]
        description: String,

        /// Duration in seconds
        #[arg(long)]
        duration: Option<u32>,

        /// Sampling temperature
        #[arg(long, default_value_t = 1.0)]
        temperature: f64,

        /// Wait until generation finishes
        #[arg(long)]
        wait: bool,
    },

    /// Edit a song's details
    Update {
        /// Song ID
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        lyrics: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        genre: Option<String>,

        #[arg(long)]
        mood: Option<String>,
    },

    /// Delete a song
    Delete {
        /// Song ID
        id: i64,
    },

    /// Make a completed song public
    Publish {
        /// Song ID
        id: i64,
    },

    /// Make a song private again
    Unpublish {
        /// Song ID
        id: i64,
    },

    /// Count a play and print the audio URL
    Play {
        /// Song ID
        id: i64,
    },

    /// Vote on a song
    Vote {
        /// Song ID
        id: i64,

        /// up or down
        vote: VoteType,
    },

    /// Remove your vote
    Unvote {
        /// Song ID
        id: i64,
    },

    /// Wait for a generating song to finish
    Wait {
        /// Song ID
        id: i64,

        /// Seconds between checks
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
        interval: u64,

        /// Checks before giving up
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        max_attempts: u32,
    },
}

/// Song row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct SongRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Genre")]
    pub genre: String,
    #[tabled(rename = "Mood")]
    pub mood: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Public")]
    pub public: bool,
    #[tabled(rename = "Plays")]
    pub plays: u64,
    #[tabled(rename = "Score")]
    pub score: i64,
    #[tabled(rename = "By")]
    pub owner: String,
}

impl From<&Song> for SongRow {
    fn from(song: &Song) -> Self {
        Self {
            id: song.id,
            title: truncate(&song.title, 40),
            genre: song.genre.clone(),
            mood: if song.mood.is_empty() { "-".to_string() } else { song.mood.clone() },
            status: song.status.to_string(),
            public: song.is_public,
            plays: song.play_count,
            score: song.score.unwrap_or(song.upvotes - song.downvotes),
            owner: song
                .user
                .as_ref()
                .map(|u| u.username.clone())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

pub async fn execute(ctx: &Context, action: SongAction) -> Result<()> {
    match action {
        SongAction::List {
            search,
            genre,
            mood,
            ordering,
            mine,
            page,
            min_duration,
            max_duration,
            min_score,
        } => {
            let query = SongQuery {
                search,
                genre,
                mood,
                ordering,
                my_songs: mine,
                page,
                duration_min: min_duration,
                duration_max: max_duration,
                min_score,
            };
            list_songs(ctx, &query).await
        }
        SongAction::Show { id } => {
            let song = ctx.client.get_song(id).await?;
            print_record(&song, ctx.format)
        }
        SongAction::Create {
            title,
            genre,
            mood,
            lyrics,
            generate_lyrics,
            description,
            duration,
            temperature,
            wait,
        } => {
            let lyrics = match lyrics {
                Some(lyrics) => lyrics,
                None if generate_lyrics => write_lyrics(ctx, &title, &genre, &mood).await?,
                None => String::new(),
            };
            let request = CreateSongRequest {
                title,
                lyrics,
                description,
                genre,
                mood,
                duration,
                temperature,
            };
            create_song(ctx, &request, wait).await
        }
        SongAction::Update {
            id,
            title,
            lyrics,
            description,
            genre,
            mood,
        } => {
            let update = SongUpdate {
                title,
                lyrics,
                description,
                genre,
                mood,
            };
            if update.is_empty() {
                print_info("Nothing to update.", ctx.quiet);
                return Ok(());
            }
            let song = ctx.client.update_song(id, &update).await?;
            print_success(&format!("Updated song #{}: {}", song.id, song.title), ctx.quiet);
            Ok(())
        }
        SongAction::Delete { id } => {
            ctx.client.delete_song(id).await?;
            print_success(&format!("Deleted song #{}", id), ctx.quiet);
            Ok(())
        }
        SongAction::Publish { id } => publish(ctx, id, PublishAction::Publish).await,
        SongAction::Unpublish { id } => publish(ctx, id, PublishAction::Unpublish).await,
        SongAction::Play { id } => play(ctx, id).await,
        SongAction::Vote { id, vote } => {
            let tally = ctx.client.vote_song(id, vote).await?;
            print_success(
                &format!(
                    "Vote recorded: +{} / -{} (score {})",
                    tally.upvotes, tally.downvotes, tally.score
                ),
                ctx.quiet,
            );
            Ok(())
        }
        SongAction::Unvote { id } => {
            let tally = ctx.client.remove_vote(id).await?;
            print_success(&format!("Vote removed (score {})", tally.score), ctx.quiet);
            Ok(())
        }
        SongAction::Wait {
            id,
            interval,
            max_attempts,
        } => {
            let config = PollConfig {
                interval: Duration::from_secs(interval.max(1)),
                max_attempts,
            };
            let song = wait_for(ctx, id, config).await?;
            print_record(&song, ctx.format)
        }
    }
}

async fn list_songs(ctx: &Context, query: &SongQuery) -> Result<()> {
    let list = ctx.client.list_songs(query).await?;

    if ctx.format == OutputFormat::Json {
        return print_record(&list, ctx.format);
    }

    let rows: Vec<SongRow> = list.results.iter().map(SongRow::from).collect();
    print_output(&rows, ctx.format)?;
    if let Some(count) = list.count {
        let more = if list.next.is_some() { " (more pages available)" } else { "" };
        print_info(&format!("{} song(s){}", count, more), ctx.quiet);
    }
    Ok(())
}

async fn write_lyrics(ctx: &Context, title: &str, genre: &str, mood: &str) -> Result<String> {
    print_info("Generating lyrics...", ctx.quiet);
    let request = LyricsRequest::for_song(title, genre, Some(mood));
    let response = ctx.client.generate_lyrics(&request).await?;
    response
        .into_lyrics()
        .map_err(|reason| anyhow::anyhow!("Lyrics generation failed: {}", reason))
}

async fn create_song(ctx: &Context, request: &CreateSongRequest, wait: bool) -> Result<()> {
    let song = ctx.client.create_song(request).await?;
    print_success(
        &format!("Created song #{}: {} ({})", song.id, song.title, song.status),
        ctx.quiet,
    );

    if wait && !song.status.is_terminal() {
        let finished = wait_for(ctx, song.id, PollConfig::default()).await?;
        print_record(&finished, ctx.format)?;
    }
    Ok(())
}

async fn wait_for(ctx: &Context, id: i64, config: PollConfig) -> Result<Song> {
    print_info(&format!("Waiting for song #{}...", id), ctx.quiet);
    let poller = SongPoller::with_config(ctx.client.clone(), config);
    let quiet = ctx.quiet;
    let song = poller
        .wait_with_progress(id, |attempt, song| {
            if !quiet && song.status == SongStatus::Generating {
                println!("  [{}/{}] still generating", attempt, config.max_attempts);
            }
        })
        .await?;

    match song.status {
        SongStatus::Failed if song.error_message.is_empty() => anyhow::bail!("Song #{} failed to generate", id),
        SongStatus::Failed => anyhow::bail!("Song #{} failed to generate: {}", id, song.error_message),
        _ => Ok(song),
    }
}

async fn publish(ctx: &Context, id: i64, action: PublishAction) -> Result<()> {
    let response = ctx.client.publish_song(id, action).await?;
    let fallback = match action {
        PublishAction::Publish => "Song published",
        PublishAction::Unpublish => "Song unpublished",
    };
    print_success(response.message.as_deref().unwrap_or(fallback), ctx.quiet);
    Ok(())
}

async fn play(ctx: &Context, id: i64) -> Result<()> {
    let song = ctx.client.get_song(id).await?;
    let Some(audio) = song.audio_file.filter(|a| !a.is_empty()) else {
        anyhow::bail!("Song #{} has no audio yet ({})", id, song.status);
    };

    // Counting the play is best effort
    match ctx.client.record_play(id).await {
        Ok(played) => log::debug!("[api:request] song #{} play count now {}", id, played.play_count),
        Err(err) => log::warn!("[api:request] Could not record play for song #{}: {}", id, err),
    }

    println!("{}", audio);
    Ok(())
}
