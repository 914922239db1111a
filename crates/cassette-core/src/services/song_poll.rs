//! Song completion polling
//!
//! Songs are generated in the background. After creation the song is
//! re-fetched on a fixed interval until it reaches `completed` or
//! `failed`, or the attempt budget runs out.

use std::time::Duration;

use crate::client::AuthenticatedRequestClient;
use crate::error::{Error, Result};
use crate::models::Song;

// ============================================================================
// Constants
// ============================================================================

/// Delay between two fetches of the song
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Fetches before giving up (5 minutes at the default interval)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

// ============================================================================
// Poller
// ============================================================================

pub struct SongPoller {
    client: AuthenticatedRequestClient,
    config: PollConfig,
}

impl SongPoller {
    pub fn new(client: AuthenticatedRequestClient) -> Self {
        Self::with_config(client, PollConfig::default())
    }

    pub fn with_config(client: AuthenticatedRequestClient, config: PollConfig) -> Self {
        Self { client, config }
    }

    /// Wait until song `id` is completed or failed
    pub async fn wait(&self, id: i64) -> Result<Song> {
        self.wait_with_progress(id, |_, _| {}).await
    }

    /// Like [`wait`](Self::wait), calling `on_update(attempt, &song)` after
    /// every successful fetch.
    ///
    /// The first fetch happens right away. Network errors and 5xx responses
    /// are logged and polling goes on. Any other error ends it.
    pub async fn wait_with_progress<F>(&self, id: i64, mut on_update: F) -> Result<Song>
    where
        F: FnMut(u32, &Song),
    {
        for attempt in 1..=self.config.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.config.interval).await;
            }

            match self.client.get_song(id).await {
                Ok(song) => {
                    log::debug!("[poll:song] #{} attempt {}: {}", id, attempt, song.status);
                    on_update(attempt, &song);
                    if song.status.is_terminal() {
                        return Ok(song);
                    }
                }
                Err(err) if err.is_transient() => {
                    log::warn!("[poll:song] #{} attempt {} failed: {}", id, attempt, err);
                }
                Err(err) => return Err(err.into()),
            }
        }

        log::warn!(
            "[poll:song] #{} still not finished after {} attempts",
            id,
            self.config.max_attempts
        );
        Err(Error::PollTimeout(format!("song {}", id)))
    }
}
