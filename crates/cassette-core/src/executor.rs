//! Request executor
//!
//! Turns a [`RequestDescriptor`] into exactly one network call and maps
//! the response to an outcome: the decoded JSON body on 2xx, an
//! [`ApiError`] with a resolved message otherwise.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{ApiError, DEFAULT_ERROR_MESSAGE};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method};

/// Immutable description of one logical API call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    endpoint: String,
    method: Method,
    body: Option<Value>,
    requires_auth: bool,
}

impl RequestDescriptor {
    /// `endpoint` is the path below the API prefix, e.g. `/songs/3/`
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            body: None,
            requires_auth: true,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Post, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Patch, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Delete, endpoint)
    }

    /// Attach a JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Send without an `Authorization` header, whatever is stored
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }
}

/// Builds and sends single requests against the API base URL
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl RequestExecutor {
    /// `base_url` already includes the API prefix, e.g. `http://host/api`
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    /// Assemble the wire request for `descriptor`
    pub fn build_request(&self, descriptor: &RequestDescriptor, access_token: Option<&str>) -> HttpRequest {
        let mut request = HttpRequest::new(
            descriptor.method(),
            format!("{}{}", self.base_url, descriptor.endpoint()),
        );
        request
            .headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        request
            .headers
            .push(("Accept".to_string(), "application/json".to_string()));

        if descriptor.requires_auth() {
            if let Some(token) = access_token.filter(|t| !t.trim().is_empty()) {
                request
                    .headers
                    .push(("Authorization".to_string(), format!("Bearer {}", token)));
            }
        }

        request.body = descriptor.body().map(Value::to_string);
        request
    }

    /// Perform one call and produce its outcome
    pub async fn send(
        &self,
        descriptor: &RequestDescriptor,
        access_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let request = self.build_request(descriptor, access_token);
        log::debug!("[api:request] {} {}", request.method, request.url);

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                log::debug!(
                    "[api:request] {} {} failed: {}",
                    descriptor.method(),
                    descriptor.endpoint(),
                    err
                );
                return Err(err);
            }
        };

        log::debug!(
            "[api:request] {} {} -> {}",
            descriptor.method(),
            descriptor.endpoint(),
            response.status
        );
        interpret_response(response)
    }
}

/// Map a raw response to an outcome
pub fn interpret_response(response: HttpResponse) -> Result<Value, ApiError> {
    let body = decode_body(&response.body);

    if response.is_success() {
        Ok(body)
    } else {
        Err(ApiError::http(response.status, resolve_error_message(&body)))
    }
}

/// Parse a response body, treating anything unparseable as `{}`
pub fn decode_body(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Null) | Err(_) => Value::Object(Map::new()),
        Ok(value) => value,
    }
}

/// Fields checked, in order, for a ready-made error message
const MESSAGE_FIELDS: [&str; 3] = ["error", "message", "detail"];

/// Pick the most useful human-readable message out of an error body.
///
/// Rules, first match wins:
/// 1. `error`, then `message`, then `detail` when it holds text
/// 2. an object of field → message(s): `"field: m1, m2; other: m3"`
/// 3. `"Request failed"`
pub fn resolve_error_message(body: &Value) -> String {
    for field in MESSAGE_FIELDS {
        if let Some(message) = body.get(field).and_then(message_text) {
            return message;
        }
    }

    if let Value::Object(fields) = body {
        let parts: Vec<String> = fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages_text(messages)))
            .collect();
        if !parts.is_empty() {
            return parts.join("; ");
        }
    }

    DEFAULT_ERROR_MESSAGE.to_string()
}

/// Text of a dedicated message field; empty and structured values don't count
fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) if !items.is_empty() && items.iter().all(|item| !item.is_object()) => {
            Some(messages_text(value))
        }
        _ => None,
    }
}

/// Render one validation entry: lists are joined with `", "`
fn messages_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
