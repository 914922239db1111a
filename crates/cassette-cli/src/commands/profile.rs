//! Profile commands

use anyhow::Result;
use cassette_core::{ApiKeyUpdate, LlmProvider, LlmSettings, ProfileUpdate};
use clap::Subcommand;

use super::Context;
use crate::output::{print_info, print_record, print_success};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show your profile
    Show,

    /// Update email or bio
    Update {
        /// New email address
        #[arg(long)]
        email: Option<String>,

        /// New bio
        #[arg(long)]
        bio: Option<String>,
    },

    /// Set the OpenAI API key used for your generations
    ApiKey {
        /// API key; pass an empty string to remove it
        key: String,

        /// Store the key but keep using the server's key
        #[arg(long)]
        disable: bool,
    },

    /// Choose the lyrics provider and model
    Llm {
        /// Provider: local, openai, comet or custom
        provider: LlmProvider,

        /// API key for the provider (kept unchanged when omitted)
        #[arg(long)]
        api_key: Option<String>,

        /// Model name
        #[arg(long)]
        model: Option<String>,

        /// Display name of a custom provider
        #[arg(long)]
        name: Option<String>,

        /// Base URL of a custom, OpenAI-compatible provider
        #[arg(long)]
        base_url: Option<String>,
    },
}

pub async fn execute(ctx: &Context, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::Show => {
            let profile = ctx.client.get_profile().await?;
            print_record(&profile, ctx.format)
        }
        ProfileAction::Update { email, bio } => {
            let update = ProfileUpdate { email, bio };
            if update.is_empty() {
                print_info("Nothing to update. Use --email or --bio.", ctx.quiet);
                return Ok(());
            }
            let profile = ctx.client.update_profile(&update).await?;
            print_success(&format!("Profile of {} updated", profile.username), ctx.quiet);
            Ok(())
        }
        ProfileAction::ApiKey { key, disable } => {
            let update = ApiKeyUpdate {
                use_own_api_key: !disable && !key.trim().is_empty(),
                openai_api_key: key,
            };
            let response = ctx.client.set_api_key(&update).await?;
            print_success(
                response.message.as_deref().unwrap_or("API key updated"),
                ctx.quiet,
            );
            Ok(())
        }
        ProfileAction::Llm {
            provider,
            api_key,
            model,
            name,
            base_url,
        } => {
            if provider == LlmProvider::Custom && base_url.as_deref().map_or(true, str::is_empty) {
                anyhow::bail!("A custom provider needs --base-url");
            }
            let settings = LlmSettings::new(provider)
                .api_key(api_key.as_deref())
                .model(model.as_deref())
                .custom(name.as_deref(), base_url.as_deref());
            let response = ctx.client.update_llm_settings(&settings).await?;
            print_success(
                response
                    .message
                    .as_deref()
                    .unwrap_or("LLM settings updated"),
                ctx.quiet,
            );
            Ok(())
        }
    }
}
