//! Song endpoints

use serde_json::json;

use super::body_of;
use crate::client::AuthenticatedRequestClient;
use crate::error::ApiError;
use crate::executor::RequestDescriptor;
use crate::models::{
    CreateSongRequest, PlayResponse, PublishAction, PublishResponse, Song, SongList, SongQuery,
    SongUpdate, VoteResponse, VoteType,
};

pub const SONGS_ENDPOINT: &str = "/songs/";
pub const CREATE_SONG_ENDPOINT: &str = "/songs/create/";

fn song_endpoint(id: i64) -> String {
    format!("/songs/{}/", id)
}

impl AuthenticatedRequestClient {
    pub async fn list_songs(&self, query: &SongQuery) -> Result<SongList, ApiError> {
        let endpoint = format!("{}?{}", SONGS_ENDPOINT, query.to_query_string());
        self.execute_as(&RequestDescriptor::get(endpoint)).await
    }

    pub async fn get_song(&self, id: i64) -> Result<Song, ApiError> {
        self.execute_as(&RequestDescriptor::get(song_endpoint(id))).await
    }

    /// Submit a song for generation; it comes back in `generating` state
    pub async fn create_song(&self, request: &CreateSongRequest) -> Result<Song, ApiError> {
        let descriptor = RequestDescriptor::post(CREATE_SONG_ENDPOINT).with_body(body_of(request));
        self.execute_as(&descriptor).await
    }

    pub async fn update_song(&self, id: i64, update: &SongUpdate) -> Result<Song, ApiError> {
        let descriptor = RequestDescriptor::patch(song_endpoint(id)).with_body(body_of(update));
        self.execute_as(&descriptor).await
    }

    pub async fn delete_song(&self, id: i64) -> Result<(), ApiError> {
        self.execute(&RequestDescriptor::delete(song_endpoint(id))).await?;
        Ok(())
    }

    /// Only completed songs can be published
    pub async fn publish_song(&self, id: i64, action: PublishAction) -> Result<PublishResponse, ApiError> {
        let descriptor = RequestDescriptor::post(format!("/songs/{}/publish/", id))
            .with_body(json!({ "action": action }));
        self.execute_as(&descriptor).await
    }

    /// Count one play; anyone may do this, logged in or not
    pub async fn record_play(&self, id: i64) -> Result<PlayResponse, ApiError> {
        let descriptor = RequestDescriptor::post(format!("/songs/{}/play/", id)).public();
        self.execute_as(&descriptor).await
    }

    /// Cast or change the caller's vote
    pub async fn vote_song(&self, id: i64, vote: VoteType) -> Result<VoteResponse, ApiError> {
        let descriptor = RequestDescriptor::post(format!("/songs/{}/vote/", id))
            .with_body(json!({ "vote_type": vote }));
        self.execute_as(&descriptor).await
    }

    pub async fn remove_vote(&self, id: i64) -> Result<VoteResponse, ApiError> {
        self.execute_as(&RequestDescriptor::delete(format!("/songs/{}/vote/", id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::executor::RequestExecutor;
    use crate::models::SongStatus;
    use crate::store::Credentials;
    use crate::test_support::{bearer, json_response, ScriptedTransport};
    use crate::transport::HttpResponse;

    fn logged_in(transport: Arc<ScriptedTransport>) -> AuthenticatedRequestClient {
        let executor = RequestExecutor::new(transport, "http://test/api");
        let client = AuthenticatedRequestClient::new(executor, Credentials::in_memory());
        client.credentials().store_pair("a1", Some("r1"));
        client
    }

    fn song(id: i64, status: &str) -> serde_json::Value {
        json!({"id": id, "title": "Tape Hiss", "genre": "ambient", "status": status, "play_count": 3})
    }

    #[tokio::test]
    async fn test_list_songs_builds_query() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![Ok(json_response(
            200,
            json!({"count": 1, "next": null, "previous": null, "results": [song(1, "completed")]}),
        ))]));
        let client = logged_in(transport.clone());

        let query = SongQuery {
            my_songs: true,
            ..SongQuery::default()
        };
        let list = client.list_songs(&query).await.unwrap();
        assert_eq!(list.results.len(), 1);
        assert_eq!(
            transport.requests()[0].url,
            "http://test/api/songs/?ordering=-created_at&my_songs=true"
        );
    }

    #[tokio::test]
    async fn test_create_song() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![Ok(json_response(
            201,
            song(5, "generating"),
        ))]));
        let client = logged_in(transport.clone());

        let created = client
            .create_song(&CreateSongRequest::new("Tape Hiss", "ambient"))
            .await
            .unwrap();
        assert_eq!(created.id, 5);
        assert_eq!(created.status, SongStatus::Generating);
        assert!(transport.requests()[0].url.ends_with(CREATE_SONG_ENDPOINT));
    }

    #[tokio::test]
    async fn test_delete_song_accepts_empty_body() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![Ok(HttpResponse::new(204, ""))]));
        let client = logged_in(transport.clone());

        client.delete_song(5).await.unwrap();
        assert_eq!(transport.requests()[0].method.as_str(), "DELETE");
    }

    #[tokio::test]
    async fn test_publish_requires_completed_song() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![Ok(json_response(
            400,
            json!({"error": "Only completed songs can be published"}),
        ))]));
        let client = logged_in(transport.clone());

        let err = client.publish_song(5, PublishAction::Publish).await.unwrap_err();
        assert_eq!(err, ApiError::http(400, "Only completed songs can be published"));
        assert_eq!(transport.requests()[0].body.as_deref(), Some(r#"{"action":"publish"}"#));
    }

    #[tokio::test]
    async fn test_record_play_is_public() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![Ok(json_response(
            200,
            json!({"play_count": 4}),
        ))]));
        let client = logged_in(transport.clone());

        let resp = client.record_play(5).await.unwrap();
        assert_eq!(resp.play_count, 4);
        assert_eq!(bearer(&transport.requests()[0]), None);
    }

    #[tokio::test]
    async fn test_vote_and_remove_vote() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![
            Ok(json_response(
                200,
                json!({"message": "Vote recorded", "upvotes": 1, "downvotes": 0, "score": 1}),
            )),
            Ok(json_response(404, json!({"error": "Vote not found."}))),
        ]));
        let client = logged_in(transport.clone());

        let resp = client.vote_song(5, VoteType::Up).await.unwrap();
        assert_eq!(resp.score, 1);
        assert_eq!(transport.requests()[0].body.as_deref(), Some(r#"{"vote_type":"up"}"#));

        let err = client.remove_vote(5).await.unwrap_err();
        assert_eq!(err.status(), 404);
        assert_eq!(err.to_string(), "Vote not found.");
    }
}
