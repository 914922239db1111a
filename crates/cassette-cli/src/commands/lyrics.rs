//! Lyrics commands

use anyhow::Result;
use cassette_core::models::DEFAULT_LYRICS_TEMPERATURE;
use cassette_core::LyricsRequest;
use clap::Subcommand;
use serde_json::json;

use super::Context;
use crate::output::{print_record, OutputFormat};

#[derive(Subcommand)]
pub enum LyricsAction {
    /// Generate lyrics from a prompt or a song idea
    Generate {
        /// Free-form prompt; built from --title/--genre/--mood when omitted
        #[arg(long, required_unless_present = "title")]
        prompt: Option<String>,

        /// Song title
        #[arg(long)]
        title: Option<String>,

        /// Genre
        #[arg(long, default_value = "pop")]
        genre: String,

        /// Mood
        #[arg(long)]
        mood: Option<String>,

        /// Extra instructions for the model
        #[arg(long)]
        instructions: Option<String>,

        /// Sampling temperature
        #[arg(long, default_value_t = DEFAULT_LYRICS_TEMPERATURE)]
        temperature: f64,
    },
}

pub async fn execute(ctx: &Context, action: LyricsAction) -> Result<()> {
    match action {
        LyricsAction::Generate {
            prompt,
            title,
            genre,
            mood,
            instructions,
            temperature,
        } => {
            let request = match (prompt, title) {
                (Some(prompt), _) => LyricsRequest::new(prompt),
                (None, Some(title)) => LyricsRequest::for_song(&title, &genre, mood.as_deref()),
                (None, None) => anyhow::bail!("Either --prompt or --title is required"),
            }
            .instructions(instructions.as_deref())
            .temperature(temperature);

            let response = ctx.client.generate_lyrics(&request).await?;
            let lyrics = response
                .into_lyrics()
                .map_err(|reason| anyhow::anyhow!("Lyrics generation failed: {}", reason))?;

            match ctx.format {
                OutputFormat::Json => print_record(&json!({ "prompt": request.prompt, "lyrics": lyrics }), ctx.format),
                OutputFormat::Table => {
                    println!("{}", lyrics);
                    Ok(())
                }
            }
        }
    }
}
