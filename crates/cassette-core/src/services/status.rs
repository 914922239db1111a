//! Server liveness monitor
//!
//! Probes the API root and reports whether the server answers. `watch`
//! keeps probing in the background and publishes state changes only.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::transport::{HttpRequest, HttpTransport, Method, ReqwestTransport};

/// Timeout of a single liveness probe
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(3);

/// Delay between probes in [`StatusMonitor::watch`]
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Not probed yet
    Unknown,
    Online,
    Offline,
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerState::Unknown => write!(f, "unknown"),
            ServerState::Online => write!(f, "online"),
            ServerState::Offline => write!(f, "offline"),
        }
    }
}

#[derive(Clone)]
pub struct StatusMonitor {
    transport: Arc<dyn HttpTransport>,
    probe_url: String,
}

impl StatusMonitor {
    /// `api_base_url` includes the API prefix; the probe hits `<api_base_url>/`
    pub fn new(transport: Arc<dyn HttpTransport>, api_base_url: &str) -> Self {
        Self {
            transport,
            probe_url: format!("{}/", api_base_url.trim_end_matches('/')),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(CHECK_TIMEOUT)?;
        Ok(Self::new(Arc::new(transport), &config.api_base_url()))
    }

    pub fn probe_url(&self) -> &str {
        &self.probe_url
    }

    /// Probe once: any 2xx is online, everything else offline
    pub async fn check(&self) -> ServerState {
        let mut request = HttpRequest::new(Method::Get, self.probe_url.clone());
        request
            .headers
            .push(("Accept".to_string(), "application/json".to_string()));
        request.timeout = Some(CHECK_TIMEOUT);

        match self.transport.send(request).await {
            Ok(response) if response.is_success() => ServerState::Online,
            Ok(response) => {
                log::debug!("[server:status] {} -> {}", self.probe_url, response.status);
                ServerState::Offline
            }
            Err(err) => {
                log::debug!("[server:status] {} unreachable: {}", self.probe_url, err);
                ServerState::Offline
            }
        }
    }

    /// Probe every `interval` in a background task.
    ///
    /// The receiver starts at [`ServerState::Unknown`] and is notified only
    /// when the state changes. The task stops once every receiver is dropped.
    pub fn watch(&self, interval: Duration) -> watch::Receiver<ServerState> {
        let (tx, rx) = watch::channel(ServerState::Unknown);
        let monitor = self.clone();

        tokio::spawn(async move {
            loop {
                let state = monitor.check().await;
                tx.send_if_modified(|current| {
                    if *current == state {
                        return false;
                    }
                    log::info!("[server:status] {} -> {}", current, state);
                    *current = state;
                    true
                });

                tokio::select! {
                    _ = tx.closed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::error::ApiError;
    use crate::test_support::{json_response, ScriptedTransport};

    #[tokio::test]
    async fn test_check_online() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![Ok(json_response(
            200,
            json!({"songs": "http://test/api/songs/"}),
        ))]));
        let monitor = StatusMonitor::new(transport.clone(), "http://test/api");
        assert_eq!(monitor.check().await, ServerState::Online);

        let requests = transport.requests();
        let request = &requests[0];
        assert_eq!(request.url, "http://test/api/");
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert_eq!(request.timeout, Some(CHECK_TIMEOUT));
    }

    #[tokio::test]
    async fn test_check_offline() {
        let transport = Arc::new(ScriptedTransport::sequence(vec![
            Ok(json_response(502, json!({}))),
            Err(ApiError::transport("Request timed out")),
        ]));
        let monitor = StatusMonitor::new(transport, "http://test/api/");
        assert_eq!(monitor.check().await, ServerState::Offline);
        assert_eq!(monitor.check().await, ServerState::Offline);
    }

    #[tokio::test]
    async fn test_watch_reports_transitions_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let transport = Arc::new(ScriptedTransport::new(move |_| {
            // online for two probes, offline afterwards
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Ok(json_response(200, json!({})))
            } else {
                Err(ApiError::transport("Connection failed"))
            }
        }));
        let monitor = StatusMonitor::new(transport, "http://test/api");

        let mut rx = monitor.watch(Duration::from_millis(1));
        assert_eq!(*rx.borrow(), ServerState::Unknown);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ServerState::Online);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ServerState::Offline);
        assert!(calls.load(Ordering::SeqCst) >= 3);
    }
}
