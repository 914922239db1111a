//! # cassette-core
//!
//! Client library for the Cassette music generation API - shared by the CLI.
//!
//! This crate provides:
//! - Credential storage for the access/refresh token pair (`store` module)
//! - Single-request execution and error message resolution (`executor` module)
//! - The authenticated client with transparent token refresh (`client` module)
//! - Typed endpoint wrappers and their models (`api`, `models` modules)
//! - Song polling and server liveness services (`services` module)
//! - Unified error handling (`error` module)

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod services;
pub mod session;
pub mod store;
pub mod transport;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use client::AuthenticatedRequestClient;
pub use config::{ClientConfig, ConfigSource};
pub use error::{ApiError, Error, Result};
pub use executor::{RequestDescriptor, RequestExecutor};
pub use store::{CredentialStore, Credentials, FileStore, MemoryStore};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};

// Re-export commonly used types from models
pub use models::{
    ApiKeyUpdate, AuthResponse, CreateSongRequest, GenreCount, LibraryStats, LlmProvider,
    LlmSettings, LyricsRequest, LyricsResponse, ProfileUpdate, PublishAction, RegisterRequest,
    Song, SongList, SongQuery, SongStatus, SongUpdate, TaskStatus, UserProfile, VoteType,
};

// Re-export commonly used types from services
pub use services::{PollConfig, ServerState, SongPoller, StatusMonitor};
pub use session::{inspect_token, SessionInfo};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version
pub fn version() -> &'static str {
    VERSION
}
