//! Data models - request and response bodies of the API

mod song;

pub use song::{
    CreateSongRequest, PlayResponse, PublishAction, PublishResponse, Song, SongList, SongQuery,
    SongStatus, SongUpdate, VoteResponse, VoteType,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Accounts
// ============================================================================

/// Public profile of a user, as returned by `/auth/profile/` and embedded in songs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub total_songs_created: i64,
    #[serde(default)]
    pub total_songs_published: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// LLM settings; API keys themselves are never returned
    #[serde(default)]
    pub llm_provider: Option<String>,
    #[serde(default)]
    pub llm_model: Option<String>,
    #[serde(default)]
    pub use_own_api_key: Option<bool>,
}

/// Body returned by login, registration and token refresh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

impl RegisterRequest {
    /// Checks that can be made before bothering the server
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(Error::validation("Username is required"));
        }
        if self.email.trim().is_empty() {
            return Err(Error::validation("Email is required"));
        }
        if self.password != self.password_confirm {
            return Err(Error::validation("Passwords do not match"));
        }
        Ok(())
    }
}

/// Partial profile update; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.bio.is_none()
    }
}

/// Legacy OpenAI key update
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyUpdate {
    pub openai_api_key: String,
    pub use_own_api_key: bool,
}

/// Lyrics/LLM provider choices offered by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Local,
    OpenAi,
    Comet,
    Custom,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Local => "local",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Comet => "comet",
            LlmProvider::Custom => "custom",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(LlmProvider::Local),
            "openai" => Ok(LlmProvider::OpenAi),
            "comet" => Ok(LlmProvider::Comet),
            "custom" => Ok(LlmProvider::Custom),
            _ => Err(format!(
                "Invalid provider: {}. Use local, openai, comet or custom",
                s
            )),
        }
    }
}

/// LLM settings update sent to `/auth/api-key/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmSettings {
    pub llm_provider: LlmProvider,
    pub use_own_api_key: bool,
    /// Omitted when blank so the server keeps the stored key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_provider_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_api_base_url: Option<String>,
}

impl LlmSettings {
    pub fn new(provider: LlmProvider) -> Self {
        Self {
            llm_provider: provider,
            use_own_api_key: provider != LlmProvider::Local,
            llm_api_key: None,
            llm_model: None,
            custom_provider_name: None,
            custom_api_base_url: None,
        }
    }

    pub fn api_key(mut self, key: Option<&str>) -> Self {
        self.llm_api_key = key.map(str::trim).filter(|k| !k.is_empty()).map(String::from);
        self
    }

    pub fn model(mut self, model: Option<&str>) -> Self {
        self.llm_model = model.filter(|m| !m.is_empty()).map(String::from);
        self
    }

    /// Name and base URL only apply to the custom provider
    pub fn custom(mut self, name: Option<&str>, base_url: Option<&str>) -> Self {
        if self.llm_provider == LlmProvider::Custom {
            self.custom_provider_name = Some(name.unwrap_or_default().to_string());
            self.custom_api_base_url = Some(base_url.unwrap_or_default().to_string());
        }
        self
    }
}

/// Acknowledgement of a key/settings update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub use_own_api_key: Option<bool>,
}

// ============================================================================
// Generation
// ============================================================================

/// Default sampling temperature for lyric generation
pub const DEFAULT_LYRICS_TEMPERATURE: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LyricsRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub temperature: f64,
}

impl LyricsRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            instructions: None,
            temperature: DEFAULT_LYRICS_TEMPERATURE,
        }
    }

    /// Build the standard prompt for a song idea
    pub fn for_song(title: &str, genre: &str, mood: Option<&str>) -> Self {
        Self::new(lyrics_prompt(title, genre, mood))
    }

    /// Empty instructions are not sent at all
    pub fn instructions(mut self, instructions: Option<&str>) -> Self {
        self.instructions = instructions
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .map(String::from);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Prompt used when asking the server to write lyrics for a song idea
pub fn lyrics_prompt(title: &str, genre: &str, mood: Option<&str>) -> String {
    let mood = match mood.map(str::trim).filter(|m| !m.is_empty()) {
        Some(mood) => format!(" with a {} mood", mood),
        None => String::new(),
    };
    format!(
        "Write song lyrics for a {} song titled \"{}\"{}.",
        genre, title, mood
    )
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LyricsResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl LyricsResponse {
    /// The generated lyrics, or the server's explanation of why there are none
    pub fn into_lyrics(self) -> std::result::Result<String, String> {
        match self.lyrics.filter(|l| !l.trim().is_empty()) {
            Some(lyrics) if self.status == "success" => Ok(lyrics),
            _ => Err(self.message.unwrap_or_else(|| "No lyrics returned".to_string())),
        }
    }
}

/// State of a background generation task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    /// Celery state: PENDING, STARTED, SUCCESS, FAILURE, ...
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self.status.as_str(), "SUCCESS" | "FAILURE" | "REVOKED")
    }
}

// ============================================================================
// Library
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryStats {
    #[serde(default)]
    pub total_songs: u64,
    #[serde(default)]
    pub completed_songs: u64,
    #[serde(default)]
    pub generating_songs: u64,
    #[serde(default)]
    pub failed_songs: u64,
    #[serde(default)]
    pub published_songs: u64,
    #[serde(default)]
    pub total_plays: u64,
    #[serde(default)]
    pub total_upvotes: i64,
    #[serde(default)]
    pub genres: Vec<GenreCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: u64,
}
