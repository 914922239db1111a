//! Authenticated request client
//!
//! Wraps [`RequestExecutor`] with the stored credentials and the
//! unauthorized-retry protocol:
//!
//! ```text
//! send ──► 401? ──no──► done
//!           │yes (authenticated request)
//!           ▼
//!       refresh ──fail──► clear tokens ──► SessionExpired
//!           │ok
//!           ▼
//!       send again (same descriptor) ──► done, whatever the status
//! ```
//!
//! Refreshes are serialized: while one is in flight, other requests that
//! hit a 401 wait for it and reuse its result instead of issuing their own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::executor::{RequestDescriptor, RequestExecutor};
use crate::store::{Credentials, FileStore};
use crate::transport::ReqwestTransport;

/// Endpoint that exchanges a refresh token for a new access token
pub const TOKEN_REFRESH_ENDPOINT: &str = "/auth/token/refresh/";

/// Result of the most recent refresh, guarded by the refresh gate
#[derive(Debug, Default)]
struct RefreshGate {
    last_succeeded: bool,
}

struct Inner {
    executor: RequestExecutor,
    credentials: Credentials,
    gate: Mutex<RefreshGate>,
    /// Bumped every time a refresh attempt completes
    refresh_epoch: AtomicU64,
}

/// API client that keeps the credential pair consistent across calls.
///
/// Cheap to clone; clones share credentials and the refresh gate.
#[derive(Clone)]
pub struct AuthenticatedRequestClient {
    inner: Arc<Inner>,
}

impl AuthenticatedRequestClient {
    pub fn new(executor: RequestExecutor, credentials: Credentials) -> Self {
        Self {
            inner: Arc::new(Inner {
                executor,
                credentials,
                gate: Mutex::new(RefreshGate::default()),
                refresh_epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Production client: reqwest transport and file-backed credentials
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        let store = FileStore::open(&config.credentials_path)?;
        let executor = RequestExecutor::new(Arc::new(transport), config.api_base_url());
        Ok(Self::new(executor, Credentials::new(Arc::new(store))))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.inner.executor
    }

    /// Whether an access token is currently stored
    pub fn is_authenticated(&self) -> bool {
        self.inner.credentials.is_authenticated()
    }

    /// Run one logical call, refreshing the access token once on a 401.
    ///
    /// A second 401 after a successful refresh is returned as-is. A failed
    /// refresh only clears credentials that are still the ones the request
    /// was sent with.
    /// Requests marked public never trigger a refresh.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> std::result::Result<Value, ApiError> {
        let epoch = self.inner.refresh_epoch.load(Ordering::SeqCst);
        let token = self.inner.credentials.access_token();

        match self.inner.executor.send(descriptor, token.as_deref()).await {
            Err(err) if err.is_unauthorized() && descriptor.requires_auth() => {
                log::info!(
                    "[api:auth] {} {} unauthorized, refreshing access token",
                    descriptor.method(),
                    descriptor.endpoint()
                );
            }
            outcome => return outcome,
        }

        if !self.refresh_after(epoch).await {
            let current = self.inner.credentials.access_token();
            // A newer login replaced the pair this request was sent with
            if current.is_some() && current != token {
                log::info!("[api:auth] Credentials changed during the request, retrying with the current token");
                return self.inner.executor.send(descriptor, current.as_deref()).await;
            }
            self.inner.credentials.clear();
            log::info!("[api:auth] Session expired, local credentials cleared");
            return Err(ApiError::SessionExpired);
        }

        let token = self.inner.credentials.access_token();
        self.inner.executor.send(descriptor, token.as_deref()).await
    }

    /// [`execute`](Self::execute) and deserialize the body into `T`
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> std::result::Result<T, ApiError> {
        let body = self.execute(descriptor).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Joins a refresh that is already in flight rather than starting a
    /// second one. Credentials are left alone on failure.
    pub async fn refresh(&self) -> bool {
        let epoch = self.inner.refresh_epoch.load(Ordering::SeqCst);
        self.refresh_after(epoch).await
    }

    /// Refresh unless another refresh completed since `observed_epoch`,
    /// in which case its result is reused.
    async fn refresh_after(&self, observed_epoch: u64) -> bool {
        let mut gate = self.inner.gate.lock().await;

        if self.inner.refresh_epoch.load(Ordering::SeqCst) != observed_epoch {
            log::debug!(
                "[api:auth] Reusing concurrent refresh result (succeeded: {})",
                gate.last_succeeded
            );
            return gate.last_succeeded;
        }

        let succeeded = self.request_new_access_token().await;
        gate.last_succeeded = succeeded;
        self.inner.refresh_epoch.fetch_add(1, Ordering::SeqCst);
        succeeded
    }

    async fn request_new_access_token(&self) -> bool {
        let Some(refresh) = self.inner.credentials.refresh_token() else {
            log::info!("[api:auth] No refresh token stored, cannot refresh");
            return false;
        };

        let descriptor = RequestDescriptor::post(TOKEN_REFRESH_ENDPOINT)
            .with_body(json!({ "refresh": refresh }))
            .public();

        // Straight to the executor: a 401 here must not recurse into a refresh
        let body = match self.inner.executor.send(&descriptor, None).await {
            Ok(body) => body,
            Err(err) => {
                log::warn!("[api:auth] Token refresh failed ({}): {}", err.status(), err);
                return false;
            }
        };

        let Some(access) = token_field(&body, "access") else {
            log::warn!("[api:auth] Token refresh response carried no access token");
            return false;
        };

        self.inner.credentials.store_access(access);
        if let Some(rotated) = token_field(&body, "refresh") {
            self.inner.credentials.store_refresh(rotated);
        }
        log::info!("[api:auth] Access token refreshed");
        true
    }
}

pub(crate) fn token_field<'a>(body: &'a Value, name: &str) -> Option<&'a str> {
    body.get(name)
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bearer, json_response, ScriptedTransport};
    use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

    fn client_with(transport: Arc<ScriptedTransport>) -> AuthenticatedRequestClient {
        let executor = RequestExecutor::new(transport, "http://test/api");
        AuthenticatedRequestClient::new(executor, Credentials::in_memory())
    }

    #[tokio::test]
    async fn test_non_401_passes_through() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![Ok(json_response(
            403,
            json!({"detail": "You do not have permission to perform this action."}),
        ))]));
        let client = client_with(transport.clone());
        client.credentials().store_pair("a1", Some("r1"));

        let err = client.execute(&RequestDescriptor::get("/songs/1/")).await.unwrap_err();
        assert_eq!(err.status(), 403);
        assert_eq!(transport.requests().len(), 1);
        assert!(client.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_then_retry_succeeds() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![
            Ok(json_response(401, json!({"detail": "Token expired"}))),
            Ok(json_response(200, json!({"access": "a2"}))),
            Ok(json_response(200, json!({"id": 1, "username": "tape"}))),
        ]));
        let client = client_with(transport.clone());
        client.credentials().store_pair("a1", Some("r1"));

        let body = client.execute(&RequestDescriptor::get("/auth/profile/")).await.unwrap();
        assert_eq!(body["username"], "tape");

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(transport.count("/auth/profile/"), 2);
        assert_eq!(bearer(&requests[0]), Some("a1"));
        // refresh is unauthenticated and carries the refresh token
        assert!(requests[1].url.ends_with(TOKEN_REFRESH_ENDPOINT));
        assert_eq!(bearer(&requests[1]), None);
        assert_eq!(requests[1].body.as_deref(), Some(r#"{"refresh":"r1"}"#));
        assert_eq!(bearer(&requests[2]), Some("a2"));

        assert_eq!(client.credentials().access_token().as_deref(), Some("a2"));
        assert_eq!(client.credentials().refresh_token().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_rotated_refresh_token_is_stored() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![
            Ok(json_response(401, json!({}))),
            Ok(json_response(200, json!({"access": "a2", "refresh": "r2"}))),
            Ok(json_response(200, json!([]))),
        ]));
        let client = client_with(transport);
        client.credentials().store_pair("a1", Some("r1"));

        client.execute(&RequestDescriptor::get("/songs/")).await.unwrap();
        assert_eq!(client.credentials().refresh_token().as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_missing_refresh_token_expires_session_without_network() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![Ok(json_response(
            401,
            json!({"detail": "Authentication credentials were not provided."}),
        ))]));
        let client = client_with(transport.clone());
        client.credentials().store_access("a1");

        let err = client.execute(&RequestDescriptor::get("/songs/")).await.unwrap_err();
        assert_eq!(err, ApiError::SessionExpired);
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(transport.count(TOKEN_REFRESH_ENDPOINT), 0);
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_refresh_clears_credentials() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![
            Ok(json_response(401, json!({}))),
            Ok(json_response(401, json!({"detail": "Token is invalid or expired", "code": "token_not_valid"}))),
        ]));
        let client = client_with(transport.clone());
        client.credentials().store_pair("a1", Some("r1"));

        let err = client.execute(&RequestDescriptor::get("/library/stats/")).await.unwrap_err();
        assert_eq!(err, ApiError::SessionExpired);
        assert_eq!(transport.count(TOKEN_REFRESH_ENDPOINT), 1);
        assert_eq!(transport.count("/library/stats/"), 1);
        assert_eq!(client.credentials().access_token(), None);
        assert_eq!(client.credentials().refresh_token(), None);
    }

    #[tokio::test]
    async fn test_refresh_transport_failure_expires_session() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![
            Ok(json_response(401, json!({}))),
            Err(ApiError::transport("Request timed out")),
        ]));
        let client = client_with(transport.clone());
        client.credentials().store_pair("a1", Some("r1"));

        let err = client.execute(&RequestDescriptor::get("/songs/")).await.unwrap_err();
        assert!(err.is_session_expired());
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_without_access_in_response_fails() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![
            Ok(json_response(401, json!({}))),
            Ok(json_response(200, json!({"ok": true}))),
        ]));
        let client = client_with(transport);
        client.credentials().store_pair("a1", Some("r1"));

        let err = client.execute(&RequestDescriptor::get("/songs/")).await.unwrap_err();
        assert!(err.is_session_expired());
    }

    #[tokio::test]
    async fn test_second_401_is_final() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![
            Ok(json_response(401, json!({}))),
            Ok(json_response(200, json!({"access": "a2"}))),
            Ok(json_response(401, json!({"detail": "User is inactive"}))),
        ]));
        let client = client_with(transport.clone());
        client.credentials().store_pair("a1", Some("r1"));

        let err = client.execute(&RequestDescriptor::get("/auth/profile/")).await.unwrap_err();
        assert_eq!(err, ApiError::http(401, "User is inactive"));
        assert_eq!(transport.count(TOKEN_REFRESH_ENDPOINT), 1);
        assert_eq!(transport.requests().len(), 3);
        // the refreshed pair is kept; only a failed refresh logs out
        assert_eq!(client.credentials().access_token().as_deref(), Some("a2"));
    }

    #[tokio::test]
    async fn test_public_401_does_not_refresh() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![Ok(json_response(
            401,
            json!({"detail": "No active account found with the given credentials"}),
        ))]));
        let client = client_with(transport.clone());
        client.credentials().store_pair("a1", Some("r1"));

        let err = client
            .execute(&RequestDescriptor::post("/auth/login/").public())
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::http(401, "No active account found with the given credentials"));
        assert_eq!(transport.requests().len(), 1);
        assert!(client.is_authenticated());
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let transport = Arc::new(ScriptedTransport::new(|request| {
            if request.url.ends_with(TOKEN_REFRESH_ENDPOINT) {
                return Ok(json_response(200, json!({"access": "fresh"})));
            }
            match bearer(request) {
                Some("fresh") => Ok(json_response(200, json!({"ok": true}))),
                _ => Ok(HttpResponse::new(401, r#"{"detail":"expired"}"#)),
            }
        }));
        let client = client_with(transport.clone());
        client.credentials().store_pair("stale", Some("r1"));

        let profile = RequestDescriptor::get("/auth/profile/");
        let songs = RequestDescriptor::get("/songs/");
        let stats = RequestDescriptor::get("/library/stats/");
        let (a, b, c) = tokio::join!(
            client.execute(&profile),
            client.execute(&songs),
            client.execute(&stats)
        );

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(transport.count(TOKEN_REFRESH_ENDPOINT), 1);
        assert_eq!(transport.count("/auth/profile/"), 2);
        assert_eq!(transport.count("/songs/"), 2);
    }

    #[tokio::test]
    async fn test_concurrent_waiters_observe_failed_refresh() {
        let transport = Arc::new(ScriptedTransport::new(|request| {
            if request.url.ends_with(TOKEN_REFRESH_ENDPOINT) {
                return Ok(json_response(401, json!({"detail": "Token is blacklisted"})));
            }
            Ok(json_response(401, json!({})))
        }));
        let client = client_with(transport.clone());
        client.credentials().store_pair("stale", Some("r1"));

        let songs = RequestDescriptor::get("/songs/");
        let stats = RequestDescriptor::get("/library/stats/");
        let (a, b) = tokio::join!(client.execute(&songs), client.execute(&stats));

        assert_eq!(a.unwrap_err(), ApiError::SessionExpired);
        assert_eq!(b.unwrap_err(), ApiError::SessionExpired);
        assert_eq!(transport.count(TOKEN_REFRESH_ENDPOINT), 1);
    }

    /// Holds requests sent with `held_token` until released
    struct HeldTransport {
        scripted: ScriptedTransport,
        held_token: &'static str,
        release: tokio::sync::Notify,
    }

    #[async_trait::async_trait]
    impl HttpTransport for HeldTransport {
        async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, ApiError> {
            if bearer(&request) == Some(self.held_token) {
                self.release.notified().await;
            }
            self.scripted.send(request).await
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_does_not_clear_newer_login() {
        let transport = Arc::new(HeldTransport {
            scripted: ScriptedTransport::new(|request| {
                if request.url.ends_with(TOKEN_REFRESH_ENDPOINT) {
                    return Ok(json_response(401, json!({"detail": "Token is blacklisted"})));
                }
                match bearer(request) {
                    Some("a-new") => Ok(json_response(200, json!({"ok": true}))),
                    _ => Ok(json_response(401, json!({}))),
                }
            }),
            held_token: "a-old",
            release: tokio::sync::Notify::new(),
        });
        let executor = RequestExecutor::new(transport.clone(), "http://test/api");
        let client = AuthenticatedRequestClient::new(executor, Credentials::in_memory());
        client.credentials().store_pair("a-old", Some("r-old"));

        let stats = RequestDescriptor::get("/library/stats/");
        let (slow, _) = tokio::join!(client.execute(&stats), async {
            // fails while the slow request is still in flight
            assert!(!client.refresh().await);
            client.credentials().store_pair("a-new", Some("r-new"));
            transport.release.notify_one();
        });

        assert_eq!(slow.unwrap()["ok"], true);
        assert_eq!(client.credentials().access_token().as_deref(), Some("a-new"));
        assert_eq!(client.credentials().refresh_token().as_deref(), Some("r-new"));
        assert_eq!(transport.scripted.count(TOKEN_REFRESH_ENDPOINT), 1);
        assert_eq!(transport.scripted.count("/library/stats/"), 2);
    }

    #[tokio::test]
    async fn test_execute_as_decode_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Profile {
            #[allow(dead_code)]
            username: String,
        }

        let transport = Arc::new(ScriptedTransport::sequence(vec![Ok(json_response(
            200,
            json!({"unexpected": true}),
        ))]));
        let client = client_with(transport);
        let err = client
            .execute_as::<Profile>(&RequestDescriptor::get("/auth/profile/"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
