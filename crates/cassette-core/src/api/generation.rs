//! Lyric generation and background task endpoints

use super::body_of;
use crate::client::AuthenticatedRequestClient;
use crate::error::ApiError;
use crate::executor::RequestDescriptor;
use crate::models::{LyricsRequest, LyricsResponse, TaskStatus};

pub const LYRICS_ENDPOINT: &str = "/generation/lyrics/";

impl AuthenticatedRequestClient {
    /// Ask the server's LLM for lyrics.
    ///
    /// A provider failure comes back as a 500 whose `message` explains it.
    pub async fn generate_lyrics(&self, request: &LyricsRequest) -> Result<LyricsResponse, ApiError> {
        let descriptor = RequestDescriptor::post(LYRICS_ENDPOINT).with_body(body_of(request));
        self.execute_as(&descriptor).await
    }

    pub async fn task_status(&self, task_id: &str) -> Result<TaskStatus, ApiError> {
        let endpoint = format!("/generation/task/{}/", task_id);
        self.execute_as(&RequestDescriptor::get(endpoint)).await
    }
}
