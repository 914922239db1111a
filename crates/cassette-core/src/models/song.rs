//! Song models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserProfile;

/// Generation state of a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongStatus {
    Generating,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl SongStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SongStatus::Completed | SongStatus::Failed)
    }
}

impl std::fmt::Display for SongStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SongStatus::Generating => "generating",
            SongStatus::Completed => "completed",
            SongStatus::Failed => "failed",
            SongStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    #[serde(default)]
    pub user: Option<UserProfile>,
    pub title: String,
    #[serde(default)]
    pub lyrics: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub audio_file: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub status: SongStatus,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub play_count: u64,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub score: Option<i64>,
    /// The caller's own vote on this song, if any
    #[serde(default)]
    pub user_vote: Option<VoteType>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of songs.
///
/// The server answers with a paginated object when pagination is enabled
/// and with a bare array otherwise; both decode into this type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SongList {
    pub count: Option<u64>,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Song>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SongListWire {
    Paginated {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<Song>,
    },
    Plain(Vec<Song>),
}

impl<'de> Deserialize<'de> for SongList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match SongListWire::deserialize(deserializer)? {
            SongListWire::Paginated {
                count,
                next,
                previous,
                results,
            } => SongList {
                count,
                next,
                previous,
                results,
            },
            SongListWire::Plain(results) => SongList {
                count: Some(results.len() as u64),
                next: None,
                previous: None,
                results,
            },
        })
    }
}

/// Default ordering of song listings: newest first
pub const DEFAULT_SONG_ORDERING: &str = "-created_at";

/// Filters for `/songs/`
#[derive(Debug, Clone, PartialEq)]
pub struct SongQuery {
    pub search: Option<String>,
    pub genre: Vec<String>,
    pub mood: Vec<String>,
    pub ordering: String,
    /// Only the caller's songs (any status) instead of public completed ones
    pub my_songs: bool,
    pub page: Option<u32>,
    pub duration_min: Option<u32>,
    pub duration_max: Option<u32>,
    pub min_score: Option<i64>,
}

impl Default for SongQuery {
    fn default() -> Self {
        Self {
            search: None,
            genre: Vec::new(),
            mood: Vec::new(),
            ordering: DEFAULT_SONG_ORDERING.to_string(),
            my_songs: false,
            page: None,
            duration_min: None,
            duration_max: None,
            min_score: None,
        }
    }
}

impl SongQuery {
    /// Form-encoded query string, without the leading `?`
    pub fn to_query_string(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());

        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query.append_pair("search", search);
        }
        for genre in &self.genre {
            query.append_pair("genre", genre);
        }
        for mood in &self.mood {
            query.append_pair("mood", mood);
        }
        query.append_pair("ordering", &self.ordering);
        if self.my_songs {
            query.append_pair("my_songs", "true");
        }
        if let Some(page) = self.page {
            query.append_pair("page", &page.to_string());
        }
        if let Some(min) = self.duration_min {
            query.append_pair("duration_min", &min.to_string());
        }
        if let Some(max) = self.duration_max {
            query.append_pair("duration_max", &max.to_string());
        }
        if let Some(score) = self.min_score {
            query.append_pair("min_score", &score.to_string());
        }

        query.finish()
    }
}

/// Body of `/songs/create/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSongRequest {
    pub title: String,
    pub lyrics: String,
    pub description: String,
    pub genre: String,
    pub mood: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub temperature: f64,
}

impl CreateSongRequest {
    pub fn new(title: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lyrics: String::new(),
            description: String::new(),
            genre: genre.into(),
            mood: String::new(),
            duration: None,
            temperature: 1.0,
        }
    }
}

/// Partial song update; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct SongUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

impl SongUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.lyrics.is_none()
            && self.description.is_none()
            && self.genre.is_none()
            && self.mood.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishAction {
    Publish,
    Unpublish,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublishResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub song: Option<Song>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

impl std::str::FromStr for VoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(VoteType::Up),
            "down" => Ok(VoteType::Down),
            _ => Err(format!("Invalid vote type: {}. Use 'up' or 'down'", s)),
        }
    }
}

/// Vote tallies after a vote was recorded or removed
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VoteResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub score: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlayResponse {
    #[serde(default)]
    pub play_count: u64,
}
